use crate::EngineResult;
use chrono::{DateTime, Utc};
use meme_badges_chain::MintReceipt;
use meme_badges_db::{BadgeDatabase, DbError, DbResult, QueueStats};
use meme_badges_types::{
    Address, BadgeKind, BadgeRecord, DeferredEvaluation, MintRequest, MintStatus,
    NewDeferredEvaluation, NewMintRequest, TxHash,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Result of asking for a new mint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Enqueued(MintRequest),
    AlreadyHeld,
    AlreadyQueued,
}

/// Shared handle to the ledger and queue. Each method is one critical
/// section over the database.
#[derive(Clone)]
pub struct BadgeStore {
    db: Arc<Mutex<BadgeDatabase>>,
}

impl BadgeStore {
    pub fn new(db: BadgeDatabase) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Run `f` with exclusive access to the database
    pub async fn with_db<T>(
        &self,
        f: impl FnOnce(&mut BadgeDatabase) -> DbResult<T>,
    ) -> EngineResult<T> {
        let mut db = self.db.lock().await;
        Ok(f(&mut *db)?)
    }

    /// Held in the ledger, or an unresolved request exists
    pub async fn is_settled(&self, subject: Address, kind: BadgeKind) -> EngineResult<bool> {
        self.with_db(|db| Ok(db.has_badge(&subject, kind)? || db.has_unresolved(&subject, kind)?))
            .await
    }

    pub async fn has_badge(&self, subject: Address, kind: BadgeKind) -> EngineResult<bool> {
        self.with_db(|db| db.has_badge(&subject, kind)).await
    }

    pub async fn try_enqueue(&self, request: NewMintRequest) -> EngineResult<EnqueueOutcome> {
        let result = {
            let mut db = self.db.lock().await;
            db.enqueue(&request, Utc::now())
        };

        match result {
            Ok(queued) => Ok(EnqueueOutcome::Enqueued(queued)),
            Err(DbError::DuplicateBadge { .. }) => Ok(EnqueueOutcome::AlreadyHeld),
            Err(DbError::AlreadyQueued { .. }) => Ok(EnqueueOutcome::AlreadyQueued),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn dequeue_next(&self) -> EngineResult<Option<MintRequest>> {
        self.with_db(|db| db.dequeue_next(Utc::now())).await
    }

    pub async fn mark_submitted(&self, id: i64, tx_hash: TxHash) -> EngineResult<MintRequest> {
        self.with_db(|db| db.mark_submitted(id, &tx_hash, Utc::now()))
            .await
    }

    /// Record the badge and confirm the request in one critical section.
    /// A record that already exists is left alone.
    pub async fn complete(
        &self,
        request: &MintRequest,
        receipt: &MintReceipt,
    ) -> EngineResult<MintRequest> {
        let now = Utc::now();
        let record = BadgeRecord {
            subject: request.recipient,
            badge_kind: request.badge_kind,
            token_id: receipt.token_id,
            related_token: request.related_token,
            minted_at: now,
            tx_hash: Some(receipt.tx_hash),
        };

        self.with_db(|db| {
            match db.record_badge(&record) {
                Ok(()) => {}
                Err(DbError::DuplicateBadge { subject, kind }) => {
                    debug!(subject = %subject, kind = %kind, "Badge already recorded");
                }
                Err(e) => return Err(e),
            }
            db.mark_confirmed(request.id, now)
        })
        .await
    }

    pub async fn mark_failed(
        &self,
        id: i64,
        error: &str,
        max_retries: u32,
        retry_at: DateTime<Utc>,
    ) -> EngineResult<MintRequest> {
        self.with_db(|db| db.mark_failed(id, error, max_retries, retry_at, Utc::now()))
            .await
    }

    pub async fn cancel(&self, id: i64) -> EngineResult<MintRequest> {
        self.with_db(|db| db.cancel(id, Utc::now())).await
    }

    pub async fn read_request(&self, id: i64) -> EngineResult<MintRequest> {
        self.with_db(|db| db.read_request(id)).await
    }

    pub async fn list_requests(
        &self,
        status: Option<MintStatus>,
        limit: usize,
    ) -> EngineResult<Vec<MintRequest>> {
        self.with_db(|db| db.list_requests(status, limit)).await
    }

    pub async fn submitted_requests(&self) -> EngineResult<Vec<MintRequest>> {
        self.with_db(|db| db.submitted_requests()).await
    }

    pub async fn read_badges(&self, subject: Address) -> EngineResult<Vec<BadgeRecord>> {
        self.with_db(|db| db.read_badges(&subject)).await
    }

    pub async fn count_badges(&self) -> EngineResult<u64> {
        self.with_db(|db| db.count_badges()).await
    }

    pub async fn queue_stats(&self) -> EngineResult<QueueStats> {
        self.with_db(|db| db.queue_stats()).await
    }

    pub async fn defer_evaluation(
        &self,
        evaluation: NewDeferredEvaluation,
        next_attempt_at: DateTime<Utc>,
    ) -> EngineResult<DeferredEvaluation> {
        self.with_db(|db| db.defer_evaluation(&evaluation, next_attempt_at, Utc::now()))
            .await
    }

    pub async fn due_evaluations(&self, limit: usize) -> EngineResult<Vec<DeferredEvaluation>> {
        self.with_db(|db| db.due_evaluations(Utc::now(), limit)).await
    }

    pub async fn reschedule_evaluation(
        &self,
        id: i64,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> EngineResult<DeferredEvaluation> {
        self.with_db(|db| db.reschedule_evaluation(id, error, next_attempt_at))
            .await
    }

    pub async fn resolve_evaluation(&self, id: i64) -> EngineResult<()> {
        self.with_db(|db| db.resolve_evaluation(id)).await
    }

    pub async fn count_deferred(&self) -> EngineResult<u64> {
        self.with_db(|db| db.count_deferred()).await
    }

    pub async fn read_cursor(&self) -> EngineResult<Option<u64>> {
        self.with_db(|db| db.read_cursor()).await
    }

    pub async fn advance_cursor(&self, block: u64) -> EngineResult<()> {
        self.with_db(|db| db.advance_cursor(block)).await
    }
}
