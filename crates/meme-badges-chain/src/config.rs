use backoff::ExponentialBackoff;
use meme_badges_types::{ether, Address, U256};
use std::time::Duration;

/// Addresses and tuning for [`crate::EvmGateway`]
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Token factory emitting `TokenCreated`
    pub factory_address: Address,

    /// Badge NFT contract the minter role is granted on
    pub badge_nft_address: Address,

    /// Transfers below this value are not forwarded as events
    pub min_transfer_value: U256,

    /// Delay between receipt polls while waiting for confirmation
    pub receipt_poll_interval: Duration,
}

impl GatewayConfig {
    pub fn new(factory_address: Address, badge_nft_address: Address) -> Self {
        Self {
            factory_address,
            badge_nft_address,
            min_transfer_value: ether(10),
            receipt_poll_interval: Duration::from_secs(2),
        }
    }
}

/// Configuration for the event reader
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Delay between polls once the reader has caught up with the head
    pub poll_interval: Duration,

    /// Maximum number of blocks per log query
    pub max_block_range: u64,

    /// First block to read; the current head when unset
    pub start_block: Option<u64>,

    /// Backoff between failed RPC attempts
    pub retry_backoff: ExponentialBackoff,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            max_block_range: 500,
            start_block: None,
            retry_backoff: ExponentialBackoff {
                initial_interval: Duration::from_millis(500),
                max_interval: Duration::from_secs(30),
                max_elapsed_time: None, // keep reconnecting
                multiplier: 2.0,
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReaderConfig::default();
        assert_eq!(config.max_block_range, 500);
        assert_eq!(config.start_block, None);
        assert!(config.retry_backoff.max_elapsed_time.is_none());

        let gateway = GatewayConfig::new(Address::ZERO, Address::ZERO);
        assert_eq!(gateway.min_transfer_value, ether(10));
    }
}
