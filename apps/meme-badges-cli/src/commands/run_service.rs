use super::check_chain;
use crate::config::ServiceConfig;
use crate::error::{CliError, CliResult};
use meme_badges_chain::{EventReader, EvmGateway};
use meme_badges_db::BadgeDatabase;
use meme_badges_engine::{
    engine_channel, AutomationLoop, BadgeStore, ChainThresholds, UnwiredMetrics,
};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinError;
use tracing::{error, info, warn};

pub async fn execute(config_path: PathBuf) -> CliResult<()> {
    println!("🚀 Starting meme badges service");

    let config = ServiceConfig::load(&config_path)?;
    let minter = config.load_minter_key()?;
    let minter_address = minter.address();

    let gateway = Arc::new(EvmGateway::with_minter(
        config.rpc_url()?,
        minter,
        config.gateway_config()?,
    ));
    let chain_id = check_chain(&gateway, &config).await?;

    println!("⛓️  Chain id: {}", chain_id);
    println!("🔑 Minter: {}", minter_address);
    println!("🏭 Factory: {}", gateway.config().factory_address);
    println!("🏅 Badge NFT: {}", gateway.config().badge_nft_address);

    let db = BadgeDatabase::open_or_create(&config.database_path)?;
    let store = BadgeStore::new(db);
    let stats = store.queue_stats().await?;
    println!(
        "🗄️  Database: {} ({} pending, {} submitted)",
        config.database_path.display(),
        stats.pending,
        stats.submitted
    );

    // Resume from the last handled block; replays are harmless
    let mut reader_config = config.reader_config();
    if reader_config.start_block.is_none() {
        reader_config.start_block = store.read_cursor().await?;
    }

    let engine_config = config.engine.to_engine_config();
    let thresholds = ChainThresholds::new(
        gateway.clone(),
        engine_config.threshold_cache_ttl,
        engine_config.read_timeout,
    );
    let engine = Arc::new(AutomationLoop::new(
        gateway.clone(),
        gateway.clone(),
        Arc::new(UnwiredMetrics),
        Arc::new(thresholds),
        store,
        engine_config.clone(),
    ));

    let (events_tx, events_rx) = mpsc::channel(engine_config.event_buffer);
    // The `check` command enqueues through the shared database, so nothing
    // in this process sends on the handle. It is held until shutdown so
    // the loop's input channel stays open.
    let (handle, inputs_rx) = engine_channel(engine_config.event_buffer);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let reader = EventReader::new(gateway.clone(), reader_config);
    let mut reader_task = tokio::spawn(reader.run(events_tx, shutdown_rx.clone()));
    let mut engine_task = tokio::spawn(engine.run(events_rx, inputs_rx, shutdown_rx));

    println!("✅ Service running, press Ctrl-C to stop");

    // Either task returning before Ctrl-C stops the service
    let early_exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            None
        }
        joined = &mut reader_task => Some((READER_TASK, task_outcome(READER_TASK, joined))),
        joined = &mut engine_task => Some((ENGINE_TASK, task_outcome(ENGINE_TASK, joined))),
    };

    println!("🛑 Shutting down");
    // Receivers are already gone when a task stopped early
    let _ = shutdown_tx.send(true);

    let mut failures = Vec::new();
    let finished = match early_exit {
        None => {
            info!("Shutdown requested");
            None
        }
        Some((task, outcome)) => {
            let reason = outcome
                .err()
                .unwrap_or_else(|| format!("{} stopped unexpectedly", task));
            error!("{}", reason);
            failures.push(reason);
            Some(task)
        }
    };

    if finished != Some(READER_TASK) {
        if let Err(reason) = task_outcome(READER_TASK, reader_task.await) {
            warn!("{}", reason);
            failures.push(reason);
        }
    }
    if finished != Some(ENGINE_TASK) {
        if let Err(reason) = task_outcome(ENGINE_TASK, engine_task.await) {
            warn!("{}", reason);
            failures.push(reason);
        }
    }
    drop(handle);

    if !failures.is_empty() {
        return Err(CliError::CommandExecution(failures.join("; ")));
    }

    println!("👋 Stopped");
    Ok(())
}

const READER_TASK: &str = "Event reader";
const ENGINE_TASK: &str = "Automation loop";

fn task_outcome<E: Display>(
    task: &str,
    joined: Result<Result<(), E>, JoinError>,
) -> Result<(), String> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{} stopped with an error: {}", task, e)),
        Err(e) => Err(format!("{} task failed: {}", task, e)),
    }
}
