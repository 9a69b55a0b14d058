use crate::error::within;
use crate::{EngineError, EngineResult};
use async_trait::async_trait;
use meme_badges_chain::ContractReader;
use meme_badges_types::{ether, BadgeKind, U256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Where badge thresholds come from
#[async_trait]
pub trait ThresholdSource: Send + Sync {
    /// Minimum observed metric for `kind`; `ThresholdUnset` when none is configured
    async fn threshold(&self, kind: BadgeKind) -> EngineResult<U256>;
}

/// Fixed thresholds, for tests and offline use
#[derive(Debug, Clone, Default)]
pub struct StaticThresholds {
    values: HashMap<BadgeKind, U256>,
}

impl StaticThresholds {
    /// Reference values of the badge catalogue
    pub fn reference() -> Self {
        Self::default()
            .with(BadgeKind::TokenCreator, U256::from(1u64))
            .with(BadgeKind::LaunchMaster, ether(1))
            .with(BadgeKind::VolumeKing, ether(100_000))
            .with(BadgeKind::CommunityBuilder, U256::from(1_000u64))
            .with(BadgeKind::DiamondHands, U256::from(180u64 * 24 * 60 * 60))
            .with(BadgeKind::ViralSensation, U256::from(10_000u64))
            .with(BadgeKind::WhaleCaller, ether(10))
            .with(BadgeKind::PerfectShot, U256::from(100u64))
    }

    pub fn with(mut self, kind: BadgeKind, value: U256) -> Self {
        self.values.insert(kind, value);
        self
    }
}

#[async_trait]
impl ThresholdSource for StaticThresholds {
    async fn threshold(&self, kind: BadgeKind) -> EngineResult<U256> {
        match self.values.get(&kind) {
            Some(value) if !value.is_zero() => Ok(*value),
            _ => Err(EngineError::ThresholdUnset(kind)),
        }
    }
}

/// Thresholds read from `badgeRequirements(kind)` on the badge contract,
/// cached for `ttl`. A zero requirement means the kind is not configured.
pub struct ChainThresholds {
    reader: Arc<dyn ContractReader>,
    ttl: Duration,
    read_timeout: Duration,
    cache: Mutex<HashMap<BadgeKind, (U256, Instant)>>,
}

impl ChainThresholds {
    pub fn new(reader: Arc<dyn ContractReader>, ttl: Duration, read_timeout: Duration) -> Self {
        Self {
            reader,
            ttl,
            read_timeout,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, kind: BadgeKind) -> Option<U256> {
        let cache = self.cache.lock().ok()?;
        cache
            .get(&kind)
            .filter(|(_, fetched_at)| fetched_at.elapsed() < self.ttl)
            .map(|(value, _)| *value)
    }

    fn store(&self, kind: BadgeKind, value: U256) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(kind, (value, Instant::now()));
        }
    }
}

#[async_trait]
impl ThresholdSource for ChainThresholds {
    async fn threshold(&self, kind: BadgeKind) -> EngineResult<U256> {
        let value = match self.cached(kind) {
            Some(value) => value,
            None => {
                let value = within(
                    "badge_requirement",
                    self.read_timeout,
                    self.reader.badge_requirement(kind),
                )
                .await?;
                debug!(kind = %kind, requirement = %value, "Refreshed badge requirement");
                self.store(kind, value);
                value
            }
        };

        if value.is_zero() {
            return Err(EngineError::ThresholdUnset(kind));
        }
        Ok(value)
    }
}
