use crate::ChainResult;
use async_trait::async_trait;
use meme_badges_types::{Address, BadgeKind, ChainEvent, MintRequest, TxHash, U256};
use std::time::Duration;

/// Registry entry the factory keeps for every token it deployed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub token: Address,
    pub creator: Address,
    pub name: String,
    pub symbol: String,
    pub total_supply: U256,
    pub initial_liquidity: U256,
    pub lock_period: U256,
    pub created_at: U256,
}

/// Arguments of `mintBadge(to, badgeType, tokenAddress, achievementValue)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintCall {
    pub recipient: Address,
    pub badge_kind: BadgeKind,
    /// Zero address when the badge is not tied to a token
    pub related_token: Address,
    pub achievement_value: U256,
}

impl MintCall {
    pub fn from_request(request: &MintRequest) -> Self {
        Self {
            recipient: request.recipient,
            badge_kind: request.badge_kind,
            related_token: request.related_token.unwrap_or(Address::ZERO),
            achievement_value: request.achievement_value,
        }
    }

    /// The four positional arguments, in contract order
    pub fn args(&self) -> (Address, u8, Address, U256) {
        (
            self.recipient,
            self.badge_kind.as_u8(),
            self.related_token,
            self.achievement_value,
        )
    }
}

/// Outcome of a mint that made it into a block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Taken from the `BadgeMinted` log
    pub token_id: Option<U256>,
}

/// Read side of the contract-call gateway
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Tokens the factory deployed for `creator`
    async fn created_tokens(&self, creator: Address) -> ChainResult<Vec<Address>>;

    async fn token_info(&self, token: Address) -> ChainResult<TokenInfo>;

    /// Whether the badge contract already holds a badge of `kind` for `subject`
    async fn has_badge(&self, subject: Address, kind: BadgeKind) -> ChainResult<bool>;

    /// Threshold configured on the badge contract; zero when unset
    async fn badge_requirement(&self, kind: BadgeKind) -> ChainResult<U256>;
}

/// Write side, held only by the mint submitter
#[async_trait]
pub trait BadgeMinter: Send + Sync {
    /// Broadcast a mint and return its transaction hash
    async fn submit_mint(&self, call: &MintCall) -> ChainResult<TxHash>;

    /// Wait until the transaction is included in a block.
    ///
    /// Fails with `ConfirmationTimeout` if no receipt shows up in time and
    /// with `Reverted` if the receipt reports failure.
    async fn await_confirmation(&self, tx_hash: TxHash, timeout: Duration)
        -> ChainResult<MintReceipt>;

    /// Receipt of a transaction that already landed successfully, without
    /// waiting. `None` while it is unknown, still pending or reverted.
    async fn find_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<MintReceipt>>;
}

/// Log source polled by the event reader
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn latest_block(&self) -> ChainResult<u64>;

    /// Decoded events in `from..=to`, ordered by block and log index
    async fn fetch_events(&self, from: u64, to: u64) -> ChainResult<Vec<ChainEvent>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use meme_badges_types::{ether, MintStatus};

    fn request(related_token: Option<Address>) -> MintRequest {
        let now = Utc::now();
        MintRequest {
            id: 1,
            recipient: Address::repeat_byte(0xaa),
            badge_kind: BadgeKind::WhaleCaller,
            related_token,
            achievement_value: ether(15),
            enqueued_at: now,
            updated_at: now,
            status: MintStatus::Pending,
            retry_count: 0,
            last_error: None,
            tx_hash: None,
            next_attempt_at: now,
        }
    }

    #[test]
    fn test_mint_call_argument_order() {
        let call = MintCall::from_request(&request(Some(Address::repeat_byte(0xcc))));
        let (to, badge_type, token, value) = call.args();

        assert_eq!(to, Address::repeat_byte(0xaa));
        assert_eq!(badge_type, 6);
        assert_eq!(token, Address::repeat_byte(0xcc));
        assert_eq!(value, ether(15));
    }

    #[test]
    fn test_missing_token_becomes_zero_address() {
        let call = MintCall::from_request(&request(None));
        assert_eq!(call.related_token, Address::ZERO);
    }
}
