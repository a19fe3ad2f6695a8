//! filing-ingest - filing pipeline service and client
//!
//! Subcommands:
//! - `serve`: run the HTTP surface over the record store
//! - `watch <session-id>`: poll a backend until the session finishes
//! - `check <file>`: run aggregate consistency checks on a Wire Format file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use filing_common::config::ServiceConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use filing_ingest::db::SqliteRecordStore;
use filing_ingest::models::StatusResponse;
use filing_ingest::services::{HttpJobBackend, PollObserver, PollResult, Poller, RetryReason};
use filing_ingest::transform::Transformer;
use filing_ingest::validators::{check_aggregates, summarize};
use filing_ingest::AppState;

#[derive(Parser, Debug)]
#[command(name = "filing-ingest")]
#[command(about = "Regulatory filing pipeline service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level or filter directive (overrides configuration)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        /// Record store file
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Poll a session until it completes, fails or times out
    Watch {
        session_id: String,
        /// Backend base URL
        #[arg(long)]
        backend_url: Option<String>,
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Write the final record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a Wire Format JSON file for inconsistent totals
    Check { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = ServiceConfig::load(args.config.as_deref())?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    // RUST_LOG wins over configuration
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!(
        "Starting filing-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match args.command {
        Command::Serve {
            host,
            port,
            database,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(database) = database {
                config.database.path = database;
            }
            serve(config).await
        }
        Command::Watch {
            session_id,
            backend_url,
            max_attempts,
            output,
        } => {
            if let Some(url) = backend_url {
                config.backend.base_url = url;
            }
            if let Some(max_attempts) = max_attempts {
                config.poller.max_attempts = max_attempts;
            }
            config.validate()?;
            watch(config, session_id, output).await
        }
        Command::Check { file } => check(config, file),
    }
}

async fn serve(config: ServiceConfig) -> Result<()> {
    info!("Database: {}", config.database.path.display());
    let pool = filing_common::db::init_database(&config.database.path).await?;
    let store = SqliteRecordStore::new(pool, config.database.max_lock_wait_ms);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(Arc::new(store), config);
    let app = filing_ingest::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    Ok(())
}

/// Prints one status line per event
struct ConsoleObserver;

impl PollObserver for ConsoleObserver {
    fn on_progress(&self, _session_id: &str, status: &StatusResponse) {
        if let Some(progress) = status.progress {
            eprintln!(
                "[{:>3}%] {}",
                progress,
                status.current_step.as_deref().unwrap_or(status.status.as_str())
            );
        }
    }

    fn on_retry(&self, _session_id: &str, reason: &RetryReason, delay: Duration) {
        if reason.is_transient_failure() {
            eprintln!("{}", reason.status_message(delay));
        }
    }

    fn on_terminal(&self, session_id: &str, outcome: &PollResult) {
        match outcome {
            Ok(record) => eprintln!("Session {} complete after {} attempts", session_id, record.attempts),
            Err(err) => eprintln!("Session {}: {}", session_id, err),
        }
    }
}

async fn watch(config: ServiceConfig, session_id: String, output: Option<PathBuf>) -> Result<()> {
    let backend = HttpJobBackend::new(&config.backend)?;
    let poller = Poller::new(Arc::new(backend), &config.poller);
    let handle = poller.spawn(session_id, Arc::new(ConsoleObserver));

    let token = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let record = handle.wait().await?;
    let rendered = serde_json::to_string_pretty(record.data.as_value())?;

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Record written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn check(config: ServiceConfig, file: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let wire: serde_json::Value = serde_json::from_str(&content)?;

    let transformer = Transformer::new(&config.transform);
    let report = check_aggregates(&transformer.to_domain(&wire));
    let summary = summarize(&report);

    println!("{}", serde_json::to_string_pretty(&report)?);
    eprintln!("{} calculation warning(s)", summary.total_count);

    Ok(())
}
