use meme_badges_types::{Address, BadgeKind, MintStatus};
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("{subject} already holds a {kind} badge")]
    DuplicateBadge { subject: Address, kind: BadgeKind },

    #[error("An unresolved {kind} mint for {recipient} is already queued")]
    AlreadyQueued { recipient: Address, kind: BadgeKind },

    #[error("Mint request {0} not found")]
    RequestNotFound(i64),

    #[error("Deferred evaluation {0} not found")]
    EvaluationNotFound(i64),

    #[error("Mint request {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: MintStatus,
        to: MintStatus,
    },

    #[error("Mint request {id} is {status} and can no longer be cancelled")]
    NotCancellable { id: i64, status: MintStatus },
}

impl DbError {
    /// Rejections that mean another path already handled the (subject, kind)
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            DbError::DuplicateBadge { .. } | DbError::AlreadyQueued { .. }
        )
    }
}
