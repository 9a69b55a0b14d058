/*!
# Meme Badges Database

Durable state of the badge engine, backed by SQLite:

- **Badge ledger**: confirmed badges, unique per (subject, kind)
- **Mint queue**: mint requests and their status history
- **Deferred evaluations**: (subject, kind) checks to repeat after a transient failure
- **Event cursor**: last block the automation loop has processed

All mutations go through [`database::BadgeDatabase`].
*/

pub mod database;
pub mod errors;
pub mod schema;

// Re-export main types for convenience
pub use database::{BadgeDatabase, QueueStats};
pub use errors::{DbError, DbResult};
