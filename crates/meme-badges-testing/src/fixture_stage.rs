#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureStage {
    /// Empty ledger, empty queue, nothing deployed
    Fresh,

    /// The creator deployed a token with enough liquidity to qualify
    TokenLaunched,

    /// The `TokenCreated` event was handled and mints are queued
    MintsQueued,

    /// A sweep confirmed the queued mints
    BadgesMinted,
}

impl FixtureStage {
    pub fn all() -> &'static [FixtureStage] {
        &[
            FixtureStage::Fresh,
            FixtureStage::TokenLaunched,
            FixtureStage::MintsQueued,
            FixtureStage::BadgesMinted,
        ]
    }

    /// Get the ordinal position of this stage in the progression
    pub fn ord(&self) -> u8 {
        match self {
            FixtureStage::Fresh => 0,
            FixtureStage::TokenLaunched => 1,
            FixtureStage::MintsQueued => 2,
            FixtureStage::BadgesMinted => 3,
        }
    }
}

impl PartialOrd for FixtureStage {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FixtureStage {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ord().cmp(&other.ord())
    }
}
