use async_trait::async_trait;
use meme_badges_types::{Address, BadgeKind, U256};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// No feed exists for this kind yet; the rule fails closed
    #[error("No metrics source is wired up for {0}")]
    Unimplemented(BadgeKind),

    #[error("Metrics source unavailable: {0}")]
    Unavailable(String),
}

/// What a metric-backed rule asks the metrics feed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricQuery {
    pub subject: Address,
    pub token: Option<Address>,
    pub kind: BadgeKind,
}

/// External indexer or social-data feed.
///
/// Units per kind:
/// - `VolumeKing`: traded volume of the subject's token, in wei
/// - `CommunityBuilder`: holder count of the token
/// - `DiamondHands`: seconds the subject has held the token
/// - `ViralSensation`: social mentions of the token
/// - `PerfectShot`: price multiple since launch
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn observe(&self, query: MetricQuery) -> Result<U256, MetricsError>;
}

/// Placeholder feed: every query reports the rule as unimplemented
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwiredMetrics;

#[async_trait]
impl MetricsSource for UnwiredMetrics {
    async fn observe(&self, query: MetricQuery) -> Result<U256, MetricsError> {
        Err(MetricsError::Unimplemented(query.kind))
    }
}
