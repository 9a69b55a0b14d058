use chrono::{DateTime, Utc};
use std::time::Duration;

/// Backoff delays stop doubling after this many attempts
const MAX_BACKOFF_EXPONENT: u32 = 10;

/// Tuning for the automation loop and the mint submitter
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval between queue sweeps
    pub sweep_interval: Duration,

    /// Failed attempts after which a request becomes terminally `Failed`
    pub max_retries: u32,

    /// Base delay before a failed request is due again; doubles per attempt
    pub retry_delay: Duration,

    /// Upper bound for broadcasting one mint transaction
    pub submit_timeout: Duration,

    /// Upper bound for waiting on a receipt
    pub confirmation_timeout: Duration,

    /// Upper bound for each contract read or metrics query
    pub read_timeout: Duration,

    /// Submissions per sweep, processed one after another
    pub max_submissions_per_sweep: usize,

    /// Capacity of the event and manual-check channels
    pub event_buffer: usize,

    /// How long chain-side thresholds are cached
    pub threshold_cache_ttl: Duration,

    /// Attempts at an evaluation that keeps failing transiently before it
    /// is dropped
    pub max_evaluation_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(15),
            submit_timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(10),
            max_submissions_per_sweep: 16,
            event_buffer: 256,
            threshold_cache_ttl: Duration::from_secs(300),
            max_evaluation_attempts: 10,
        }
    }
}

impl EngineConfig {
    /// `retry_delay * 2^attempts`, capped
    pub fn backoff_delay(&self, attempts: u32) -> Duration {
        let factor = 1u32 << attempts.min(MAX_BACKOFF_EXPONENT);
        self.retry_delay.saturating_mul(factor)
    }

    /// Wall-clock time `backoff_delay(attempts)` from now
    pub fn retry_at(&self, attempts: u32) -> DateTime<Utc> {
        let delay = self.backoff_delay(attempts);
        Utc::now() + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_submissions_per_sweep, 16);
        assert_eq!(config.max_evaluation_attempts, 10);
    }

    #[test]
    fn test_backoff_delay_doubles() {
        let config = EngineConfig {
            retry_delay: Duration::from_secs(15),
            ..Default::default()
        };

        assert_eq!(config.backoff_delay(0), Duration::from_secs(15));
        assert_eq!(config.backoff_delay(1), Duration::from_secs(30));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(60));
        assert_eq!(config.backoff_delay(50), Duration::from_secs(15 * 1024));
    }
}
