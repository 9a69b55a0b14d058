use crate::error::{CliError, CliResult};
use meme_badges_db::BadgeDatabase;
use meme_badges_types::{MintRequest, MintStatus};
use serde::Serialize;
use std::path::PathBuf;

/// JSON shape of one queue entry
#[derive(Debug, Serialize)]
struct RequestView {
    id: i64,
    recipient: String,
    badge_kind: String,
    related_token: Option<String>,
    achievement_value: String,
    status: String,
    retry_count: u32,
    last_error: Option<String>,
    tx_hash: Option<String>,
    enqueued_at: String,
    updated_at: String,
}

impl From<&MintRequest> for RequestView {
    fn from(request: &MintRequest) -> Self {
        Self {
            id: request.id,
            recipient: request.recipient.to_checksum(None),
            badge_kind: request.badge_kind.to_string(),
            related_token: request.related_token.map(|t| t.to_checksum(None)),
            achievement_value: request.achievement_value.to_string(),
            status: request.status.to_string(),
            retry_count: request.retry_count,
            last_error: request.last_error.clone(),
            tx_hash: request.tx_hash.map(|h| h.to_string()),
            enqueued_at: request.enqueued_at.to_rfc3339(),
            updated_at: request.updated_at.to_rfc3339(),
        }
    }
}

pub fn execute(
    database: PathBuf,
    status: Option<String>,
    limit: usize,
    json: bool,
) -> CliResult<()> {
    let db = BadgeDatabase::open(&database)?;

    let status = status
        .map(|s| {
            s.parse::<MintStatus>()
                .map_err(|e| CliError::CommandExecution(e.to_string()))
        })
        .transpose()?;

    let requests = db.list_requests(status, limit)?;

    if json {
        let views: Vec<RequestView> = requests.iter().map(RequestView::from).collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    let stats = db.queue_stats()?;
    println!("📊 Mint queue");
    println!(
        "   pending: {}  submitted: {}  confirmed: {}  failed: {}  cancelled: {}",
        stats.pending, stats.submitted, stats.confirmed, stats.failed, stats.cancelled
    );

    if requests.is_empty() {
        println!("📭 No matching requests");
        return Ok(());
    }

    println!();
    for request in &requests {
        println!(
            "{} #{:<5} {:<18} {:<10} {} (attempts: {})",
            status_icon(request.status),
            request.id,
            request.badge_kind.to_string(),
            request.status.to_string(),
            request.recipient,
            request.retry_count
        );
        if let Some(error) = &request.last_error {
            println!("         last error: {}", error);
        }
    }

    Ok(())
}

fn status_icon(status: MintStatus) -> &'static str {
    match status {
        MintStatus::Pending => "⏳",
        MintStatus::Submitted => "📤",
        MintStatus::Confirmed => "✅",
        MintStatus::Failed => "❌",
        MintStatus::Cancelled => "🚫",
    }
}
