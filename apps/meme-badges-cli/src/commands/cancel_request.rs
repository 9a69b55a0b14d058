use crate::error::CliResult;
use chrono::Utc;
use meme_badges_db::BadgeDatabase;
use std::path::PathBuf;

pub fn execute(database: PathBuf, id: i64) -> CliResult<()> {
    let mut db = BadgeDatabase::open(&database)?;

    let request = db.cancel(id, Utc::now())?;

    println!(
        "🚫 Cancelled request {}: {} for {}",
        request.id, request.badge_kind, request.recipient
    );
    Ok(())
}
