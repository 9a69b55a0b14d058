use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Achievement categories known to the badge contract.
///
/// The discriminant is the `uint8 badgeType` the contract expects, so the
/// order of variants must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum BadgeKind {
    /// Created at least one token through the factory
    TokenCreator = 0,
    /// Launched a token with initial liquidity above the threshold
    LaunchMaster = 1,
    /// Trading volume above the threshold
    VolumeKing = 2,
    /// Holder count above the threshold
    CommunityBuilder = 3,
    /// Held a position for longer than the threshold
    DiamondHands = 4,
    /// Social mention count above the threshold
    ViralSensation = 5,
    /// Attracted a single large investment
    WhaleCaller = 6,
    /// Extreme price multiple since launch
    PerfectShot = 7,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown badge kind: {0}")]
pub struct UnknownBadgeKind(pub String);

impl BadgeKind {
    pub const ALL: [BadgeKind; 8] = [
        BadgeKind::TokenCreator,
        BadgeKind::LaunchMaster,
        BadgeKind::VolumeKing,
        BadgeKind::CommunityBuilder,
        BadgeKind::DiamondHands,
        BadgeKind::ViralSensation,
        BadgeKind::WhaleCaller,
        BadgeKind::PerfectShot,
    ];

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    /// Stable name used for persistence and the CLI
    pub const fn as_str(self) -> &'static str {
        match self {
            BadgeKind::TokenCreator => "token_creator",
            BadgeKind::LaunchMaster => "launch_master",
            BadgeKind::VolumeKing => "volume_king",
            BadgeKind::CommunityBuilder => "community_builder",
            BadgeKind::DiamondHands => "diamond_hands",
            BadgeKind::ViralSensation => "viral_sensation",
            BadgeKind::WhaleCaller => "whale_caller",
            BadgeKind::PerfectShot => "perfect_shot",
        }
    }

    /// Kinds whose rule needs an external metrics feed (indexer or social data)
    pub const fn requires_metrics(self) -> bool {
        matches!(
            self,
            BadgeKind::VolumeKing
                | BadgeKind::CommunityBuilder
                | BadgeKind::DiamondHands
                | BadgeKind::ViralSensation
                | BadgeKind::PerfectShot
        )
    }
}

impl fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BadgeKind {
    type Err = UnknownBadgeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownBadgeKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminants_match_contract() {
        for (index, kind) in BadgeKind::ALL.iter().enumerate() {
            assert_eq!(kind.as_u8() as usize, index);
            assert_eq!(BadgeKind::from_u8(index as u8), Some(*kind));
        }
        assert_eq!(BadgeKind::from_u8(8), None);
    }

    #[test]
    fn test_parse_accepts_dashes_and_case() {
        assert_eq!(
            "Whale-Caller".parse::<BadgeKind>().unwrap(),
            BadgeKind::WhaleCaller
        );
        assert_eq!(
            "token_creator".parse::<BadgeKind>().unwrap(),
            BadgeKind::TokenCreator
        );
        assert!("moon_boy".parse::<BadgeKind>().is_err());
    }

    #[test]
    fn test_metric_backed_kinds() {
        let metric_backed: Vec<_> = BadgeKind::ALL
            .iter()
            .filter(|k| k.requires_metrics())
            .collect();
        assert_eq!(metric_backed.len(), 5);
        assert!(!BadgeKind::TokenCreator.requires_metrics());
        assert!(!BadgeKind::LaunchMaster.requires_metrics());
        assert!(!BadgeKind::WhaleCaller.requires_metrics());
    }
}
