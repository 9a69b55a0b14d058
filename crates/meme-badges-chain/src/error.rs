use meme_badges_types::TxHash;
use std::time::Duration;
use thiserror::Error;

pub type ChainResult<T> = Result<T, ChainError>;

/// Errors that can occur while talking to the chain
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("RPC transport error: {0}")]
    Rpc(#[from] alloy::transports::TransportError),

    #[error("Contract call failed: {0}")]
    Contract(#[from] alloy::contract::Error),

    #[error("Failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    #[error("Transaction {tx_hash} reverted")]
    Reverted { tx_hash: TxHash },

    #[error("Transaction {tx_hash} not confirmed within {waited:?}")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Chain endpoint unavailable: {0}")]
    Unavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ChainError {
    /// Failures expected to clear up on their own (network, timeouts).
    ///
    /// A JSON-RPC error response is deterministic for the same request, e.g.
    /// a log query over the provider's result limit or an `eth_call` revert,
    /// so it is not transient.
    pub fn is_transient(&self) -> bool {
        match self {
            ChainError::Rpc(e) => !e.is_error_resp(),
            ChainError::Contract(alloy::contract::Error::TransportError(e)) => !e.is_error_resp(),
            ChainError::Timeout { .. }
            | ChainError::ConfirmationTimeout { .. }
            | ChainError::Unavailable(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;
    use alloy::transports::TransportErrorKind;

    #[test]
    fn test_error_responses_are_not_transient() {
        let limited = ChainError::Rpc(alloy::transports::TransportError::ErrorResp(ErrorPayload {
            code: -32005,
            message: "query returned more than 10000 results".into(),
            data: None,
        }));
        assert!(!limited.is_transient());

        let dropped = ChainError::Rpc(TransportErrorKind::backend_gone());
        assert!(dropped.is_transient());

        assert!(ChainError::Unavailable("connection reset".to_string()).is_transient());
        assert!(!ChainError::Reverted {
            tx_hash: TxHash::ZERO
        }
        .is_transient());
    }
}
