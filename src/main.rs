//! notifsync daemon
//!
//! Composition root: wires the HTTP feed, the device scheduler, the session
//! and one sync engine together, mounts the lifecycle controller, and runs
//! an interactive console in place of the notification screen.

mod console;

use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt};

use notifsync_adapters::{ChannelScheduler, HttpNotificationFeed, SessionIdentity};
use notifsync_core::config::AppConfig;
use notifsync_core::error::AppError;
use notifsync_engine::{NotificationStore, SyncDeps, SyncEngine};
use notifsync_worker::{AppState, LifecycleController};

use console::{Command, Console, ConsoleRouter};

/// Notification sync daemon with an interactive console
#[derive(Debug, Parser)]
#[command(name = "notifsync-daemon", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Sign in as this user, overriding the configured session
    #[arg(short, long)]
    user: Option<String>,

    /// Polling interval in seconds
    #[arg(short, long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Daemon error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment, then apply CLI overrides
fn load_configuration(cli: &Cli) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load(&cli.config)?;

    if let Some(user) = &cli.user {
        config.session.user_id = Some(user.clone());
    }
    if let Some(seconds) = cli.interval {
        config.sync.poll_interval_seconds = seconds;
    }

    Ok(config)
}

/// Initialize tracing/logging. Logs go to stderr so they do not interleave
/// with console output on stdout.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting notifsync v{}", env!("CARGO_PKG_VERSION"));

    let feed = Arc::new(HttpNotificationFeed::new(
        &config.api,
        config.session.access_token.clone(),
    )?);
    let scheduler = Arc::new(ChannelScheduler::new(&config.scheduler));
    let identity = Arc::new(SessionIdentity::from_config(&config.session));

    let engine = Arc::new(SyncEngine::new(
        SyncDeps {
            feed,
            scheduler: scheduler.clone(),
            identity: identity.clone(),
            router: Arc::new(ConsoleRouter),
        },
        Arc::new(NotificationStore::new()),
        config.sync.clone(),
    ));

    let lifecycle = LifecycleController::new(Arc::clone(&engine)).mount(AppState::Foreground);
    tracing::info!(
        "Polling {} every {}s",
        config.api.base_url,
        config.sync.poll_interval().as_secs()
    );

    let mut console = Console {
        engine,
        scheduler,
        identity,
        lifecycle,
    };
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Failed to read from stdin: {}", e);
                        break;
                    }
                };
                match line.parse::<Command>() {
                    Ok(command) => {
                        if !console.execute(command).await {
                            return Ok(());
                        }
                    }
                    Err(msg) => println!("{}", msg),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, shutting down...");
                break;
            }
        }
    }

    console.lifecycle.unmount().await;
    tracing::info!("notifsync shut down");
    Ok(())
}
