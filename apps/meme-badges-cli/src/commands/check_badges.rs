use super::check_chain;
use crate::config::{parse_address, ServiceConfig};
use crate::error::CliResult;
use meme_badges_chain::EvmGateway;
use meme_badges_db::BadgeDatabase;
use meme_badges_engine::{AutomationLoop, BadgeStore, ChainThresholds, UnwiredMetrics};
use std::path::PathBuf;
use std::sync::Arc;

/// One-shot evaluation. Eligible badges are queued for the running
/// service to mint; nothing is sent from here.
pub async fn execute(config_path: PathBuf, subject: String, token: Option<String>) -> CliResult<()> {
    let config = ServiceConfig::load(&config_path)?;
    let subject = parse_address(&subject)?;
    let token = token.as_deref().map(parse_address).transpose()?;

    let gateway = Arc::new(EvmGateway::read_only(
        config.rpc_url()?,
        config.gateway_config()?,
    ));
    let chain_id = check_chain(&gateway, &config).await?;
    println!("⛓️  Connected to chain {}", chain_id);

    let engine_config = config.engine.to_engine_config();
    let store = BadgeStore::new(BadgeDatabase::open_or_create(&config.database_path)?);
    let thresholds = ChainThresholds::new(
        gateway.clone(),
        engine_config.threshold_cache_ttl,
        engine_config.read_timeout,
    );

    // Read-only gateway as minter: this command never sweeps
    let engine = AutomationLoop::new(
        gateway.clone(),
        gateway.clone(),
        Arc::new(UnwiredMetrics),
        Arc::new(thresholds),
        store.clone(),
        engine_config,
    );

    println!("🔍 Checking badges for {}", subject);
    let queued = engine.check_badges(subject, token).await;

    if queued.is_empty() {
        println!("📭 Nothing new to mint");
    } else {
        println!("✅ Queued {} mint request(s):", queued.len());
        for request in &queued {
            println!(
                "   #{} {} (achievement value {})",
                request.id, request.badge_kind, request.achievement_value
            );
        }
    }

    let deferred = store.count_deferred().await?;
    if deferred > 0 {
        println!("⏳ {} evaluation(s) deferred for the service to retry", deferred);
    }

    let held = store.read_badges(subject).await?;
    println!("🏅 Badges already held: {}", held.len());

    Ok(())
}
