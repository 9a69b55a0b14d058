use crate::{Address, BadgeKind, U256};
use chrono::{DateTime, Utc};

/// An evaluation that hit a transient failure and has to be repeated.
///
/// Carries everything the triggering event contributed, so the rule can be
/// re-run without the event. The transfer value in particular exists nowhere
/// else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDeferredEvaluation {
    pub subject: Address,
    pub badge_kind: BadgeKind,
    pub related_token: Option<Address>,
    pub transfer_value: Option<U256>,
    pub error: String,
}

/// A persisted deferred evaluation, at most one per (subject, kind)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredEvaluation {
    pub id: i64,
    pub subject: Address,
    pub badge_kind: BadgeKind,
    pub related_token: Option<Address>,
    pub transfer_value: Option<U256>,
    /// Failed evaluations so far, including the one that deferred it
    pub attempts: u32,
    pub last_error: String,
    pub deferred_at: DateTime<Utc>,
    pub next_attempt_at: DateTime<Utc>,
}
