use crate::metrics::MetricsError;
use meme_badges_chain::ChainError;
use meme_badges_db::DbError;
use meme_badges_types::BadgeKind;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("No requirement configured for {0}")]
    ThresholdUnset(BadgeKind),
}

impl EngineError {
    /// DuplicateBadge / AlreadyQueued: another path already handled the pair
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, EngineError::Db(e) if e.is_invariant_violation())
    }

    /// Repeating the same evaluation later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Chain(e) => e.is_transient(),
            EngineError::Metrics(MetricsError::Unavailable(_)) => true,
            EngineError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// The rule depends on a data feed that is not wired up
    pub fn is_unimplemented_rule(&self) -> bool {
        matches!(self, EngineError::Metrics(MetricsError::Unimplemented(_)))
    }
}

/// Run `operation`, turning an elapsed deadline into `EngineError::Timeout`
pub(crate) async fn within<T, E, F>(operation: &'static str, after: Duration, future: F) -> EngineResult<T>
where
    F: Future<Output = Result<T, E>>,
    EngineError: From<E>,
{
    match tokio::time::timeout(after, future).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(EngineError::Timeout { operation, after }),
    }
}
