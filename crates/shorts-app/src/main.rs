//! Shorts Blocker - backend binary.
//!
//! Runs the HTTP API the browser extension mirrors its state to, and
//! offers a one-shot aggregate recompute for scheduled jobs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use shorts_core::api::AggregateStatsResponse;
use shorts_server::{Server, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
use shorts_storage::Database;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Shorts Blocker backend
#[derive(Parser, Debug)]
#[command(name = "shorts-blocker", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Run the HTTP API server (default)
    Serve {
        /// Host address to bind to
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Database file (defaults to the app data directory)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },

    /// Recompute aggregate statistics and print the snapshot as JSON
    Aggregate {
        /// Database file (defaults to the app data directory)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: None,
        }
    }
}

/// Get the logs directory path.
fn logs_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "shorts-blocker", "shorts-blocker")
        .map(|dirs| dirs.data_dir().join("logs"))
}

/// Initialize logging with file rotation.
fn init_logging(args: &Args) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_level = if args.debug { "debug" } else { &args.log_level };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "shorts_blocker={0},shorts_server={0},shorts_storage={0},shorts_core={0},warn",
            log_level
        ))
    });

    if let Some(log_dir) = logs_dir() {
        if std::fs::create_dir_all(&log_dir).is_ok() {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(5)
                .filename_prefix("shorts-blocker")
                .filename_suffix("log")
                .build(&log_dir)
                .ok();

            if let Some(appender) = file_appender {
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(std::io::stdout))
                    .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                    .init();

                tracing::info!("Logging to {:?}", log_dir);
                return Some(guard);
            }
        }
    }

    // Fallback: console logging only
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::warn!("File logging unavailable, using console only");
    None
}

fn open_database(db_path: Option<PathBuf>) -> anyhow::Result<Database> {
    let path = match db_path {
        Some(path) => path,
        None => Database::default_db_path()?,
    };
    let db = Database::with_path(&path)
        .map_err(|e| anyhow::anyhow!("Database error at {:?}: {}", path, e))?;
    Ok(db)
}

async fn serve(host: String, port: u16, db_path: Option<PathBuf>) -> anyhow::Result<()> {
    let db = open_database(db_path)?;
    let config = ServerConfig::default().with_host(host).with_port(port);

    let server = Server::with_database(config, db)?;
    tracing::info!("API listening on http://{}/api", server.addr());
    server.run().await?;
    Ok(())
}

fn aggregate(db_path: Option<PathBuf>) -> anyhow::Result<()> {
    let db = open_database(db_path)?;
    let snapshot: AggregateStatsResponse = db.refresh_aggregate()?.into();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Keep the guard alive so buffered file logs flush on exit
    let _log_guard = init_logging(&args);

    tracing::info!("Starting Shorts Blocker {}", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Args: {:?}", args);

    match args.command.unwrap_or_default() {
        Command::Serve {
            host,
            port,
            db_path,
        } => serve(host, port, db_path).await?,
        Command::Aggregate { db_path } => aggregate(db_path)?,
    }

    tracing::info!("Shorts Blocker shutting down");
    Ok(())
}
