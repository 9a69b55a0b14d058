use crate::BadgeKind;
use alloy::primitives::{Address, TxHash, U256};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle of a queued mint
///
/// `Pending -> Submitted -> Confirmed`, `Submitted -> Pending` on a retryable
/// failure, `Pending | Submitted -> Failed` once retries are exhausted and
/// `Pending -> Cancelled` by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MintStatus {
    Pending,
    Submitted,
    Confirmed,
    Failed,
    Cancelled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown mint status: {0}")]
pub struct UnknownMintStatus(pub String);

impl MintStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            MintStatus::Pending => "pending",
            MintStatus::Submitted => "submitted",
            MintStatus::Confirmed => "confirmed",
            MintStatus::Failed => "failed",
            MintStatus::Cancelled => "cancelled",
        }
    }

    /// Unresolved requests block a new request for the same (subject, kind)
    pub const fn is_unresolved(self) -> bool {
        matches!(self, MintStatus::Pending | MintStatus::Submitted)
    }

    pub const fn is_terminal(self) -> bool {
        !self.is_unresolved()
    }
}

impl fmt::Display for MintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MintStatus {
    type Err = UnknownMintStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(MintStatus::Pending),
            "submitted" => Ok(MintStatus::Submitted),
            "confirmed" => Ok(MintStatus::Confirmed),
            "failed" => Ok(MintStatus::Failed),
            "cancelled" => Ok(MintStatus::Cancelled),
            _ => Err(UnknownMintStatus(s.to_string())),
        }
    }
}

/// A mint the automation loop decided on but has not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMintRequest {
    pub recipient: Address,
    pub badge_kind: BadgeKind,
    pub related_token: Option<Address>,
    pub achievement_value: U256,
}

/// A persisted entry of the mint queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub id: i64,
    pub recipient: Address,
    pub badge_kind: BadgeKind,
    pub related_token: Option<Address>,
    pub achievement_value: U256,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: MintStatus,
    pub retry_count: u32,
    pub last_error: Option<String>,
    pub tx_hash: Option<TxHash>,
    /// Earliest time a pending retry may be dequeued again
    pub next_attempt_at: DateTime<Utc>,
}

/// A confirmed badge held by a subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeRecord {
    pub subject: Address,
    pub badge_kind: BadgeKind,
    /// NFT id from the `BadgeMinted` log, if the receipt carried one
    pub token_id: Option<U256>,
    pub related_token: Option<Address>,
    pub minted_at: DateTime<Utc>,
    pub tx_hash: Option<TxHash>,
}

/// One observation produced while evaluating a rule. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityFact {
    pub subject: Address,
    pub badge_kind: BadgeKind,
    /// Native unit of the rule: a count, or wei for value-denominated kinds
    pub observed_metric: U256,
    pub as_of: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_names() {
        for status in [
            MintStatus::Pending,
            MintStatus::Submitted,
            MintStatus::Confirmed,
            MintStatus::Failed,
            MintStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<MintStatus>().unwrap(), status);
        }
        assert!("lost".parse::<MintStatus>().is_err());
    }

    #[test]
    fn test_unresolved_states() {
        assert!(MintStatus::Pending.is_unresolved());
        assert!(MintStatus::Submitted.is_unresolved());
        assert!(MintStatus::Confirmed.is_terminal());
        assert!(MintStatus::Failed.is_terminal());
        assert!(MintStatus::Cancelled.is_terminal());
    }
}
