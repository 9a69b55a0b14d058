use crate::error::CliResult;
use meme_badges_db::BadgeDatabase;
use std::path::PathBuf;

pub fn execute(database: PathBuf, overwrite: bool) -> CliResult<()> {
    println!("🗄️  Creating badge database: {}", database.display());

    let db = BadgeDatabase::create_file(&database, overwrite)?;
    let stats = db.queue_stats()?;

    println!("✅ Database ready");
    println!("   Badges recorded: {}", db.count_badges()?);
    println!("   Unresolved requests: {}", stats.unresolved());

    Ok(())
}
