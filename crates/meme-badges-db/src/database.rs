/*!
# Database Operations

Single interface for the badge ledger, the mint queue, deferred evaluations
and the event cursor.
Every check-and-insert runs inside one SQLite transaction and is backed by a
unique constraint, so the at-most-one invariants hold even if two writers
race on the same (subject, kind).
*/

use crate::{
    schema::{check_schema, initialize_database},
    DbError, DbResult,
};
use chrono::{DateTime, Utc};
use meme_badges_types::{
    hex, Address, BadgeKind, BadgeRecord, DeferredEvaluation, MintRequest, MintStatus,
    NewDeferredEvaluation, NewMintRequest, TxHash, U256,
};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const REQUEST_COLUMNS: &str = "id, recipient, badge_kind, related_token, achievement_value, \
     status, retry_count, last_error, tx_hash, enqueued_at, updated_at, next_attempt_at";

const RECORD_COLUMNS: &str = "subject, badge_kind, token_id, related_token, minted_at, tx_hash";

const DEFERRED_COLUMNS: &str = "id, subject, badge_kind, related_token, transfer_value, \
     attempts, last_error, deferred_at, next_attempt_at";

/// Busy timeout so operator commands can share a file with the running service
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Request counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: u64,
    pub submitted: u64,
    pub confirmed: u64,
    pub failed: u64,
    pub cancelled: u64,
}

impl QueueStats {
    pub fn unresolved(&self) -> u64 {
        self.pending + self.submitted
    }
}

/// Unified database interface for the badge engine
#[derive(Debug)]
pub struct BadgeDatabase {
    conn: Connection,
}

impl BadgeDatabase {
    /// Open an existing database file
    pub fn open(path: &Path) -> DbResult<Self> {
        if !path.exists() {
            return Err(DbError::InvalidConfig(format!(
                "Database file does not exist: {}",
                path.display()
            )));
        }

        let conn = Connection::open(path)
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self { conn };
        if !db.verify_schema()? {
            return Err(DbError::InvalidConfig(format!(
                "Database file has invalid schema: {}",
                path.display()
            )));
        }

        Ok(db)
    }

    /// Open the file if it exists, otherwise create it with a fresh schema
    pub fn open_or_create(path: &Path) -> DbResult<Self> {
        if path.exists() {
            Self::open(path)
        } else {
            Self::create_file(path, false)
        }
    }

    /// Create a new in-memory database with initialized schema
    pub fn create_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            DbError::Connection(format!("Failed to create in-memory database: {}", e))
        })?;

        initialize_database(&conn)?;

        Ok(Self { conn })
    }

    /// Create a new database file, overwriting if it exists and `overwrite` is set
    pub fn create_file(path: &Path, overwrite: bool) -> DbResult<Self> {
        if path.exists() && !overwrite {
            return Err(DbError::InvalidConfig(format!(
                "Database file already exists (use overwrite=true to replace): {}",
                path.display()
            )));
        }

        if path.exists() && overwrite {
            std::fs::remove_file(path)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| DbError::Connection(format!("Failed to create database file: {}", e)))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        initialize_database(&conn)?;

        Ok(Self { conn })
    }

    /// Check if database has proper schema
    pub fn verify_schema(&self) -> DbResult<bool> {
        check_schema(&self.conn)
    }

    // ------------------------------------------------------------------
    // Badge ledger
    // ------------------------------------------------------------------

    pub fn has_badge(&self, subject: &Address, kind: BadgeKind) -> DbResult<bool> {
        badge_exists(&self.conn, &encode_address(subject), kind)
    }

    /// Append a confirmed badge. Fails with `DuplicateBadge` if the pair exists.
    pub fn record_badge(&mut self, record: &BadgeRecord) -> DbResult<()> {
        let inserted = self.conn.execute(
            "INSERT INTO badge_records (subject, badge_kind, token_id, related_token, minted_at, tx_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                encode_address(&record.subject),
                record.badge_kind.as_u8(),
                record.token_id.map(|id| id.to_string()),
                record.related_token.as_ref().map(encode_address),
                record.minted_at.timestamp_millis(),
                record.tx_hash.as_ref().map(encode_tx_hash),
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(DbError::DuplicateBadge {
                subject: record.subject,
                kind: record.badge_kind,
            }),
            Err(e) => Err(DbError::Database(e)),
        }
    }

    /// All badges held by a subject, ordered by kind
    pub fn read_badges(&self, subject: &Address) -> DbResult<Vec<BadgeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM badge_records WHERE subject = ?1 ORDER BY badge_kind"
        ))?;

        let rows = stmt.query_map([encode_address(subject)], RecordRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }

        Ok(records)
    }

    pub fn count_badges(&self) -> DbResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM badge_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ------------------------------------------------------------------
    // Mint queue
    // ------------------------------------------------------------------

    pub fn has_unresolved(&self, recipient: &Address, kind: BadgeKind) -> DbResult<bool> {
        unresolved_exists(&self.conn, &encode_address(recipient), kind)
    }

    /// Insert a new pending request.
    ///
    /// Rejects with `DuplicateBadge` when the badge is already recorded and with
    /// `AlreadyQueued` when an unresolved request exists for the same pair.
    pub fn enqueue(&mut self, request: &NewMintRequest, now: DateTime<Utc>) -> DbResult<MintRequest> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let recipient = encode_address(&request.recipient);
        let kind = request.badge_kind;

        if badge_exists(&tx, &recipient, kind)? {
            return Err(DbError::DuplicateBadge {
                subject: request.recipient,
                kind,
            });
        }

        if unresolved_exists(&tx, &recipient, kind)? {
            return Err(DbError::AlreadyQueued {
                recipient: request.recipient,
                kind,
            });
        }

        let now_ms = now.timestamp_millis();
        let inserted = tx.execute(
            "INSERT INTO mint_requests
                (recipient, badge_kind, related_token, achievement_value, status,
                 retry_count, enqueued_at, updated_at, next_attempt_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6, ?6)",
            params![
                recipient,
                kind.as_u8(),
                request.related_token.as_ref().map(encode_address),
                request.achievement_value.to_string(),
                MintStatus::Pending.as_str(),
                now_ms,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(DbError::AlreadyQueued {
                    recipient: request.recipient,
                    kind,
                })
            }
            Err(e) => return Err(DbError::Database(e)),
        }

        let created = read_request_with(&tx, tx.last_insert_rowid())?;

        tx.commit()
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(created)
    }

    /// Oldest pending request that is due and not waiting behind an older
    /// unresolved request of the same recipient
    pub fn dequeue_next(&self, now: DateTime<Utc>) -> DbResult<Option<MintRequest>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {REQUEST_COLUMNS} FROM mint_requests WHERE id = (
                        SELECT r.id FROM mint_requests r
                        WHERE r.status = 'pending'
                          AND r.next_attempt_at <= ?1
                          AND NOT EXISTS (
                              SELECT 1 FROM mint_requests o
                              WHERE o.recipient = r.recipient
                                AND o.status IN ('pending', 'submitted')
                                AND o.id < r.id
                          )
                        ORDER BY r.id
                        LIMIT 1
                    )"
                ),
                [now.timestamp_millis()],
                RequestRow::from_row,
            )
            .optional()?;

        row.map(RequestRow::into_request).transpose()
    }

    /// Pending -> Submitted
    pub fn mark_submitted(
        &mut self,
        id: i64,
        tx_hash: &TxHash,
        now: DateTime<Utc>,
    ) -> DbResult<MintRequest> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let current = read_request_with(&tx, id)?;
        ensure_transition(&current, &[MintStatus::Pending], MintStatus::Submitted)?;

        tx.execute(
            "UPDATE mint_requests SET status = ?1, tx_hash = ?2, updated_at = ?3 WHERE id = ?4",
            params![
                MintStatus::Submitted.as_str(),
                encode_tx_hash(tx_hash),
                now.timestamp_millis(),
                id
            ],
        )?;

        let updated = read_request_with(&tx, id)?;
        tx.commit()
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(updated)
    }

    /// Submitted -> Confirmed
    pub fn mark_confirmed(&mut self, id: i64, now: DateTime<Utc>) -> DbResult<MintRequest> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let current = read_request_with(&tx, id)?;
        ensure_transition(&current, &[MintStatus::Submitted], MintStatus::Confirmed)?;

        tx.execute(
            "UPDATE mint_requests SET status = ?1, last_error = NULL, updated_at = ?2 WHERE id = ?3",
            params![MintStatus::Confirmed.as_str(), now.timestamp_millis(), id],
        )?;

        let updated = read_request_with(&tx, id)?;
        tx.commit()
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(updated)
    }

    /// Record a failed attempt.
    ///
    /// The request goes back to `Pending` (due at `retry_at`) while
    /// `retry_count + 1 < max_retries`, otherwise it becomes `Failed`.
    pub fn mark_failed(
        &mut self,
        id: i64,
        error: &str,
        max_retries: u32,
        retry_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DbResult<MintRequest> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let current = read_request_with(&tx, id)?;
        let attempts = current.retry_count.saturating_add(1);
        let next_status = if attempts < max_retries {
            MintStatus::Pending
        } else {
            MintStatus::Failed
        };
        ensure_transition(
            &current,
            &[MintStatus::Pending, MintStatus::Submitted],
            next_status,
        )?;

        tx.execute(
            "UPDATE mint_requests
             SET status = ?1, retry_count = ?2, last_error = ?3, updated_at = ?4, next_attempt_at = ?5
             WHERE id = ?6",
            params![
                next_status.as_str(),
                attempts,
                error,
                now.timestamp_millis(),
                retry_at.timestamp_millis(),
                id
            ],
        )?;

        let updated = read_request_with(&tx, id)?;
        tx.commit()
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(updated)
    }

    /// Pending -> Cancelled. Submitted requests run to completion.
    pub fn cancel(&mut self, id: i64, now: DateTime<Utc>) -> DbResult<MintRequest> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let current = read_request_with(&tx, id)?;
        if current.status != MintStatus::Pending {
            return Err(DbError::NotCancellable {
                id,
                status: current.status,
            });
        }

        tx.execute(
            "UPDATE mint_requests SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![MintStatus::Cancelled.as_str(), now.timestamp_millis(), id],
        )?;

        let updated = read_request_with(&tx, id)?;
        tx.commit()
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(updated)
    }

    pub fn read_request(&self, id: i64) -> DbResult<MintRequest> {
        read_request_with(&self.conn, id)
    }

    /// Requests in enqueue order, optionally filtered by status
    pub fn list_requests(
        &self,
        status: Option<MintStatus>,
        limit: usize,
    ) -> DbResult<Vec<MintRequest>> {
        let limit = limit.min(i64::MAX as usize) as i64;
        let mut requests = Vec::new();

        match status {
            Some(status) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {REQUEST_COLUMNS} FROM mint_requests WHERE status = ?1 ORDER BY id LIMIT ?2"
                ))?;
                let rows =
                    stmt.query_map(params![status.as_str(), limit], RequestRow::from_row)?;
                for row in rows {
                    requests.push(row?.into_request()?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {REQUEST_COLUMNS} FROM mint_requests ORDER BY id LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit], RequestRow::from_row)?;
                for row in rows {
                    requests.push(row?.into_request()?);
                }
            }
        }

        Ok(requests)
    }

    /// Requests whose transaction was broadcast but never resolved
    pub fn submitted_requests(&self) -> DbResult<Vec<MintRequest>> {
        self.list_requests(Some(MintStatus::Submitted), usize::MAX)
    }

    pub fn queue_stats(&self) -> DbResult<QueueStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM mint_requests GROUP BY status")?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((status, count))
        })?;

        let mut stats = QueueStats::default();
        for row in rows {
            let (status, count) = row?;
            let count = count as u64;
            match MintStatus::from_str(&status)
                .map_err(|e| DbError::Serialization(e.to_string()))?
            {
                MintStatus::Pending => stats.pending = count,
                MintStatus::Submitted => stats.submitted = count,
                MintStatus::Confirmed => stats.confirmed = count,
                MintStatus::Failed => stats.failed = count,
                MintStatus::Cancelled => stats.cancelled = count,
            }
        }

        Ok(stats)
    }

    // ------------------------------------------------------------------
    // Deferred evaluations
    // ------------------------------------------------------------------

    /// Remember an evaluation to repeat at `next_attempt_at`.
    ///
    /// If the pair is already deferred its original context and schedule are
    /// kept and only the error is refreshed.
    pub fn defer_evaluation(
        &mut self,
        evaluation: &NewDeferredEvaluation,
        next_attempt_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> DbResult<DeferredEvaluation> {
        let tx = self
            .conn
            .transaction()
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        let subject = encode_address(&evaluation.subject);
        tx.execute(
            "INSERT INTO deferred_evaluations
                (subject, badge_kind, related_token, transfer_value, attempts, last_error,
                 deferred_at, next_attempt_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6, ?7)
             ON CONFLICT(subject, badge_kind) DO UPDATE SET last_error = excluded.last_error",
            params![
                subject,
                evaluation.badge_kind.as_u8(),
                evaluation.related_token.as_ref().map(encode_address),
                evaluation.transfer_value.map(|value| value.to_string()),
                evaluation.error,
                now.timestamp_millis(),
                next_attempt_at.timestamp_millis(),
            ],
        )?;

        let stored = tx
            .query_row(
                &format!(
                    "SELECT {DEFERRED_COLUMNS} FROM deferred_evaluations
                     WHERE subject = ?1 AND badge_kind = ?2"
                ),
                params![subject, evaluation.badge_kind.as_u8()],
                DeferredRow::from_row,
            )?
            .into_evaluation()?;

        tx.commit()
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        Ok(stored)
    }

    /// Deferred evaluations due at `now`, oldest schedule first
    pub fn due_evaluations(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> DbResult<Vec<DeferredEvaluation>> {
        let limit = limit.min(i64::MAX as usize) as i64;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DEFERRED_COLUMNS} FROM deferred_evaluations
             WHERE next_attempt_at <= ?1 ORDER BY next_attempt_at, id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![now.timestamp_millis(), limit], DeferredRow::from_row)?;

        let mut evaluations = Vec::new();
        for row in rows {
            evaluations.push(row?.into_evaluation()?);
        }
        Ok(evaluations)
    }

    /// Count another failed attempt and push the next one out
    pub fn reschedule_evaluation(
        &mut self,
        id: i64,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> DbResult<DeferredEvaluation> {
        let updated = self.conn.execute(
            "UPDATE deferred_evaluations
             SET attempts = attempts + 1, last_error = ?1, next_attempt_at = ?2
             WHERE id = ?3",
            params![error, next_attempt_at.timestamp_millis(), id],
        )?;
        if updated == 0 {
            return Err(DbError::EvaluationNotFound(id));
        }

        let row = self.conn.query_row(
            &format!("SELECT {DEFERRED_COLUMNS} FROM deferred_evaluations WHERE id = ?1"),
            [id],
            DeferredRow::from_row,
        )?;
        row.into_evaluation()
    }

    /// Drop a deferred evaluation once it ran to a verdict or was given up
    pub fn resolve_evaluation(&mut self, id: i64) -> DbResult<()> {
        self.conn
            .execute("DELETE FROM deferred_evaluations WHERE id = ?1", [id])?;
        Ok(())
    }

    pub fn count_deferred(&self) -> DbResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM deferred_evaluations",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ------------------------------------------------------------------
    // Event cursor
    // ------------------------------------------------------------------

    pub fn read_cursor(&self) -> DbResult<Option<u64>> {
        let block: Option<i64> = self
            .conn
            .query_row(
                "SELECT last_block FROM reader_cursor WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(block.map(|b| b as u64))
    }

    /// Move the cursor forward; never moves it back
    pub fn advance_cursor(&mut self, block: u64) -> DbResult<()> {
        let block = i64::try_from(block)
            .map_err(|_| DbError::Serialization(format!("Block number out of range: {}", block)))?;

        self.conn.execute(
            "INSERT INTO reader_cursor (id, last_block) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET last_block = MAX(last_block, excluded.last_block)",
            [block],
        )?;

        Ok(())
    }
}

fn badge_exists(conn: &Connection, subject: &str, kind: BadgeKind) -> DbResult<bool> {
    let found: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM badge_records WHERE subject = ?1 AND badge_kind = ?2)",
        params![subject, kind.as_u8()],
        |row| row.get(0),
    )?;
    Ok(found != 0)
}

fn unresolved_exists(conn: &Connection, recipient: &str, kind: BadgeKind) -> DbResult<bool> {
    let found: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM mint_requests
            WHERE recipient = ?1 AND badge_kind = ?2 AND status IN ('pending', 'submitted')
        )",
        params![recipient, kind.as_u8()],
        |row| row.get(0),
    )?;
    Ok(found != 0)
}

fn read_request_with(conn: &Connection, id: i64) -> DbResult<MintRequest> {
    let row = conn
        .query_row(
            &format!("SELECT {REQUEST_COLUMNS} FROM mint_requests WHERE id = ?1"),
            [id],
            RequestRow::from_row,
        )
        .optional()?;

    match row {
        Some(row) => row.into_request(),
        None => Err(DbError::RequestNotFound(id)),
    }
}

fn ensure_transition(current: &MintRequest, allowed: &[MintStatus], to: MintStatus) -> DbResult<()> {
    if allowed.contains(&current.status) {
        Ok(())
    } else {
        Err(DbError::InvalidTransition {
            id: current.id,
            from: current.status,
            to,
        })
    }
}

fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

fn encode_address(address: &Address) -> String {
    address.to_checksum(None)
}

fn decode_address(value: &str) -> DbResult<Address> {
    Address::from_str(value).map_err(|e| DbError::InvalidAddress(format!("{}: {}", value, e)))
}

fn encode_tx_hash(tx_hash: &TxHash) -> String {
    hex::encode_prefixed(tx_hash)
}

fn decode_tx_hash(value: &str) -> DbResult<TxHash> {
    TxHash::from_str(value)
        .map_err(|e| DbError::Serialization(format!("Invalid tx hash {}: {}", value, e)))
}

fn decode_u256(value: &str) -> DbResult<U256> {
    U256::from_str(value)
        .map_err(|e| DbError::Serialization(format!("Invalid integer {}: {}", value, e)))
}

fn decode_kind(value: u8) -> DbResult<BadgeKind> {
    BadgeKind::from_u8(value)
        .ok_or_else(|| DbError::Serialization(format!("Unknown badge kind discriminant: {}", value)))
}

fn decode_time(millis: i64) -> DbResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::Serialization(format!("Invalid timestamp: {}", millis)))
}

/// Raw `mint_requests` row before parsing
struct RequestRow {
    id: i64,
    recipient: String,
    badge_kind: u8,
    related_token: Option<String>,
    achievement_value: String,
    status: String,
    retry_count: u32,
    last_error: Option<String>,
    tx_hash: Option<String>,
    enqueued_at: i64,
    updated_at: i64,
    next_attempt_at: i64,
}

impl RequestRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            recipient: row.get(1)?,
            badge_kind: row.get(2)?,
            related_token: row.get(3)?,
            achievement_value: row.get(4)?,
            status: row.get(5)?,
            retry_count: row.get(6)?,
            last_error: row.get(7)?,
            tx_hash: row.get(8)?,
            enqueued_at: row.get(9)?,
            updated_at: row.get(10)?,
            next_attempt_at: row.get(11)?,
        })
    }

    fn into_request(self) -> DbResult<MintRequest> {
        Ok(MintRequest {
            id: self.id,
            recipient: decode_address(&self.recipient)?,
            badge_kind: decode_kind(self.badge_kind)?,
            related_token: self.related_token.as_deref().map(decode_address).transpose()?,
            achievement_value: decode_u256(&self.achievement_value)?,
            status: MintStatus::from_str(&self.status)
                .map_err(|e| DbError::Serialization(e.to_string()))?,
            retry_count: self.retry_count,
            last_error: self.last_error,
            tx_hash: self.tx_hash.as_deref().map(decode_tx_hash).transpose()?,
            enqueued_at: decode_time(self.enqueued_at)?,
            updated_at: decode_time(self.updated_at)?,
            next_attempt_at: decode_time(self.next_attempt_at)?,
        })
    }
}

/// Raw `badge_records` row before parsing
struct RecordRow {
    subject: String,
    badge_kind: u8,
    token_id: Option<String>,
    related_token: Option<String>,
    minted_at: i64,
    tx_hash: Option<String>,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            subject: row.get(0)?,
            badge_kind: row.get(1)?,
            token_id: row.get(2)?,
            related_token: row.get(3)?,
            minted_at: row.get(4)?,
            tx_hash: row.get(5)?,
        })
    }

    fn into_record(self) -> DbResult<BadgeRecord> {
        Ok(BadgeRecord {
            subject: decode_address(&self.subject)?,
            badge_kind: decode_kind(self.badge_kind)?,
            token_id: self.token_id.as_deref().map(decode_u256).transpose()?,
            related_token: self.related_token.as_deref().map(decode_address).transpose()?,
            minted_at: decode_time(self.minted_at)?,
            tx_hash: self.tx_hash.as_deref().map(decode_tx_hash).transpose()?,
        })
    }
}

/// Raw `deferred_evaluations` row before parsing
struct DeferredRow {
    id: i64,
    subject: String,
    badge_kind: u8,
    related_token: Option<String>,
    transfer_value: Option<String>,
    attempts: u32,
    last_error: String,
    deferred_at: i64,
    next_attempt_at: i64,
}

impl DeferredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            subject: row.get(1)?,
            badge_kind: row.get(2)?,
            related_token: row.get(3)?,
            transfer_value: row.get(4)?,
            attempts: row.get(5)?,
            last_error: row.get(6)?,
            deferred_at: row.get(7)?,
            next_attempt_at: row.get(8)?,
        })
    }

    fn into_evaluation(self) -> DbResult<DeferredEvaluation> {
        Ok(DeferredEvaluation {
            id: self.id,
            subject: decode_address(&self.subject)?,
            badge_kind: decode_kind(self.badge_kind)?,
            related_token: self.related_token.as_deref().map(decode_address).transpose()?,
            transfer_value: self.transfer_value.as_deref().map(decode_u256).transpose()?,
            attempts: self.attempts,
            last_error: self.last_error,
            deferred_at: decode_time(self.deferred_at)?,
            next_attempt_at: decode_time(self.next_attempt_at)?,
        })
    }
}
