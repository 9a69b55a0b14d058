use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;

use error::CliResult;

#[derive(Parser)]
#[command(name = "meme-badges")]
#[command(about = "Meme Badges - achievement badge eligibility and minting service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the event reader, eligibility checks and mint submission
    Run {
        /// Service configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Create an empty badge database
    InitDb {
        /// Database file to create
        #[arg(short, long)]
        database: PathBuf,

        /// Replace an existing file
        #[arg(long)]
        overwrite: bool,
    },

    /// Evaluate one subject and queue the badges it qualifies for
    Check {
        /// Service configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Address to evaluate
        #[arg(short, long)]
        subject: String,

        /// Token to evaluate launch badges against
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Show the mint queue
    Queue {
        /// Badge database file
        #[arg(short, long)]
        database: PathBuf,

        /// Only show requests in this status
        #[arg(short, long)]
        status: Option<String>,

        /// Maximum number of requests to show
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Cancel a pending mint request
    Cancel {
        /// Badge database file
        #[arg(short, long)]
        database: PathBuf,

        /// Request id
        id: i64,
    },

    /// List the badges a subject holds
    Badges {
        /// Badge database file
        #[arg(short, long)]
        database: PathBuf,

        /// Subject address
        subject: String,
    },
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => commands::run_service::execute(config).await,

        Commands::InitDb {
            database,
            overwrite,
        } => commands::init_db::execute(database, overwrite),

        Commands::Check {
            config,
            subject,
            token,
        } => commands::check_badges::execute(config, subject, token).await,

        Commands::Queue {
            database,
            status,
            limit,
            json,
        } => commands::queue_status::execute(database, status, limit, json),

        Commands::Cancel { database, id } => commands::cancel_request::execute(database, id),

        Commands::Badges { database, subject } => {
            commands::list_badges::execute(database, subject)
        }
    }
}
