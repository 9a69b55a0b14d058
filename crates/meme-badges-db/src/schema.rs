/*!
# Database Schema Management

Schema for the badge ledger, the mint queue, deferred evaluations and the
event reader cursor.
*/

use crate::DbResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Current database schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize database with complete schema
pub fn initialize_database(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- Confirmed badges, at most one per (subject, badge_kind)
        CREATE TABLE badge_records (
            subject TEXT NOT NULL,
            badge_kind INTEGER NOT NULL, -- on-chain uint8 discriminant
            token_id TEXT, -- decimal NFT id from the BadgeMinted log
            related_token TEXT,
            minted_at INTEGER NOT NULL, -- unix millis
            tx_hash TEXT,
            PRIMARY KEY (subject, badge_kind)
        );

        -- Mint queue, retained after terminal states for auditing
        CREATE TABLE mint_requests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient TEXT NOT NULL,
            badge_kind INTEGER NOT NULL,
            related_token TEXT,
            achievement_value TEXT NOT NULL, -- decimal U256
            status TEXT NOT NULL,
            retry_count INTEGER NOT NULL DEFAULT 0,
            last_error TEXT,
            tx_hash TEXT,
            enqueued_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            next_attempt_at INTEGER NOT NULL
        );

        -- One unresolved request per (recipient, badge_kind)
        CREATE UNIQUE INDEX idx_mint_requests_unresolved
            ON mint_requests(recipient, badge_kind)
            WHERE status IN ('pending', 'submitted');
        CREATE INDEX idx_mint_requests_status ON mint_requests(status, id);
        CREATE INDEX idx_mint_requests_recipient ON mint_requests(recipient, id);

        -- Evaluations waiting to be repeated after a transient failure
        CREATE TABLE deferred_evaluations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject TEXT NOT NULL,
            badge_kind INTEGER NOT NULL,
            related_token TEXT,
            transfer_value TEXT, -- decimal U256
            attempts INTEGER NOT NULL DEFAULT 1,
            last_error TEXT NOT NULL,
            deferred_at INTEGER NOT NULL,
            next_attempt_at INTEGER NOT NULL,
            UNIQUE (subject, badge_kind)
        );
        CREATE INDEX idx_deferred_evaluations_due ON deferred_evaluations(next_attempt_at, id);

        -- Last block the automation loop has processed
        CREATE TABLE reader_cursor (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_block INTEGER NOT NULL
        );

        -- Schema version tracking
        CREATE TABLE schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        );
        "#,
    )?;

    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        params![SCHEMA_VERSION, chrono::Utc::now().timestamp_millis()],
    )?;

    Ok(())
}

/// Check if database is properly initialized
pub fn check_schema(conn: &Connection) -> DbResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master
         WHERE type = 'table'
           AND name IN ('badge_records', 'mint_requests', 'deferred_evaluations', 'reader_cursor')",
        [],
        |row| row.get(0),
    )?;

    Ok(count == 4)
}

/// Get current schema version from database
pub fn get_schema_version(conn: &Connection) -> DbResult<Option<i32>> {
    let table_exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        return Ok(None);
    }

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get::<_, i32>(0),
        )
        .optional()?;

    Ok(version)
}
