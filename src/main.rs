mod commands;
mod gateway;
#[cfg(test)]
mod testing;

use anyhow::Context;
use chrono::{Datelike, Utc};
use clap::{Parser, Subcommand};
use commands::CommandContext;
use gateway::{Gateway, SessionEnd};
use hearsay_channels::irc::IrcSession;
use hearsay_core::config::{self, Config, LoggingConfig};
use hearsay_inference::{HttpInference, InferenceService};
use hearsay_storage::{ConsentCache, Store};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "hearsay",
    version,
    about = "hearsay — IRC authorship attribution bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the network and start capturing (default).
    Start,
    /// Print the configuration and check the store and the inference service.
    Status,
    /// Import an IRC log for opted-in handles.
    Import {
        /// Log file with `Mon DD HH:MM:SS nick message` lines.
        path: String,
        /// Channel to record the messages under (defaults to the configured channel).
        #[arg(long)]
        channel: Option<String>,
        /// Year of the log's timestamps (defaults to the current year).
        #[arg(long)]
        year: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _guard = init_logging(&cfg.logging);

    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => start(cfg).await,
        Commands::Status => status(&cfg, &cli.config).await,
        Commands::Import {
            path,
            channel,
            year,
        } => import(&cfg, &path, channel, year).await,
    }
}

/// Stderr logging, plus a daily-rolling file when `logging.dir` is set.
///
/// `RUST_LOG` overrides the configured level. The returned guard must live
/// until exit so the file writer flushes.
fn init_logging(cfg: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    let stderr = fmt::layer().with_writer(std::io::stderr);

    match &cfg.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "hearsay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .init();
            None
        }
    }
}

async fn start(cfg: Config) -> anyhow::Result<()> {
    let store = Store::new(&cfg.storage).await?;
    let consent = ConsentCache::new();
    consent.load(&store).await?;

    let inference: Arc<dyn InferenceService> =
        Arc::new(HttpInference::from_config(&cfg.inference)?);
    if let Err(e) = inference.ping().await {
        warn!("inference service not reachable yet: {e}");
    }
    let commands = Arc::new(CommandContext::new(&cfg, store, consent, inference));

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let (session, events) = IrcSession::connect(&cfg.bot).await?;
    let gateway = Gateway::new(&cfg, Arc::new(session), commands, cancel);

    match gateway.run(events).await {
        SessionEnd::Shutdown => {
            info!("hearsay stopped");
            Ok(())
        }
        SessionEnd::Disconnected => anyhow::bail!("disconnected by peer"),
    }
}

/// Cancel the shared token on SIGINT or SIGTERM.
async fn shutdown_signal(cancel: CancellationToken) {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
        _ = cancel.cancelled() => return,
    }
    info!("shutdown signal received");
    cancel.cancel();
}

async fn status(cfg: &Config, config_path: &str) -> anyhow::Result<()> {
    println!("hearsay — status check\n");
    println!("Config: {config_path}");
    println!(
        "Server: {}:{} (tls: {}) as {}",
        cfg.bot.server, cfg.bot.port, cfg.bot.tls, cfg.bot.nick
    );
    println!("Channel: {} | prefix: {}", cfg.bot.channel, cfg.bot.prefix);
    println!(
        "Message pool: {} | quotas: {} messages, {} people | deletion after {} day(s)",
        cfg.storage.message_pool_size,
        cfg.storage.message_quota,
        cfg.storage.people_quota,
        cfg.scheduler.deletion_days
    );
    println!();

    match Store::new(&cfg.storage).await {
        Ok(store) => {
            let consent = ConsentCache::new();
            match consent.load(&store).await {
                Ok(count) => println!("  storage: ok ({count} opted-in handles)"),
                Err(e) => println!("  storage: error ({e})"),
            }
        }
        Err(e) => println!("  storage: unavailable ({e})"),
    }

    let inference = HttpInference::from_config(&cfg.inference)?;
    match inference.ping().await {
        Ok(()) => println!("  inference: reachable at {}", cfg.inference.base_url),
        Err(e) => println!("  inference: unreachable ({e})"),
    }
    Ok(())
}

async fn import(
    cfg: &Config,
    path: &str,
    channel: Option<String>,
    year: Option<i32>,
) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let store = Store::new(&cfg.storage).await?;
    let channel = channel.unwrap_or_else(|| cfg.bot.channel.clone());
    let year = year.unwrap_or_else(|| Utc::now().year());

    let summary = store.import_log(&content, &channel, year).await?;
    println!(
        "Imported {} messages into {channel} ({} duplicates, {} from ineligible nicks, {} malformed lines skipped)",
        summary.imported, summary.duplicates, summary.ineligible, summary.malformed
    );
    Ok(())
}
