/*!
# Meme Badges Types

Domain model shared by the ledger, the chain gateway and the automation
engine: badge kinds, mint requests and their lifecycle, badge records, the
chain events the engine reacts to and evaluations deferred after a transient
failure.
*/

mod badge_kind;
mod evaluation;
mod events;
mod mint;

pub use badge_kind::{BadgeKind, UnknownBadgeKind};
pub use evaluation::{DeferredEvaluation, NewDeferredEvaluation};
pub use events::{ChainEvent, LargeTransfer, TokenCreated};
pub use mint::{
    BadgeRecord, EligibilityFact, MintRequest, MintStatus, NewMintRequest, UnknownMintStatus,
};

// Re-export the primitive types used across the workspace
pub use alloy::primitives::{hex, Address, TxHash, U256};

/// Wei in one ether
pub const WEI_PER_ETHER: u64 = 1_000_000_000_000_000_000;

/// Whole ether amount in wei
pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(WEI_PER_ETHER)
}
