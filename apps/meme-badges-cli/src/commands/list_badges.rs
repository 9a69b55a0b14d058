use crate::config::parse_address;
use crate::error::CliResult;
use meme_badges_db::BadgeDatabase;
use std::path::PathBuf;

pub fn execute(database: PathBuf, subject: String) -> CliResult<()> {
    let db = BadgeDatabase::open(&database)?;
    let subject = parse_address(&subject)?;

    let badges = db.read_badges(&subject)?;
    if badges.is_empty() {
        println!("📭 {} holds no badges", subject);
        return Ok(());
    }

    println!("🏅 {} holds {} badge(s):", subject, badges.len());
    for badge in badges {
        println!(
            "   {:<18} minted {}",
            badge.badge_kind.to_string(),
            badge.minted_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if let Some(token_id) = badge.token_id {
            println!("     NFT id: {}", token_id);
        }
        if let Some(token) = badge.related_token {
            println!("     Token: {}", token);
        }
        if let Some(tx_hash) = badge.tx_hash {
            println!("     Tx: {}", tx_hash);
        }
    }

    Ok(())
}
