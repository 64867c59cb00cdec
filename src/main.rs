//! Keywatch CLI entry point.
//!
//! Provides `start`, `check`, and `scan` subcommands for running the watcher
//! daemon, validating configuration, or replaying an existing log file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use url::Url;

use keywatch::config::KeywatchConfig;
use keywatch::notifier::{StdoutNotifier, WebhookNotifier};
use keywatch::pipeline::Pipeline;
use keywatch::tailer::LogTailer;
use keywatch::{keywords, logging};

/// Keywatch — posts Minecraft server log events to a Discord webhook.
#[derive(Parser)]
#[command(name = "keywatch", version, about)]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the keywatch daemon.
    Start,
    /// Validate configuration and keyword rules, then exit.
    Check,
    /// Replay an existing log file through the keyword rules, printing
    /// notifications to stdout instead of posting them.
    Scan {
        /// Log file to replay.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Start => handle_start().await,
        Command::Check => handle_check(),
        Command::Scan { file } => handle_scan(&file).await,
    }
}

/// Run the keywatch daemon.
async fn handle_start() -> anyhow::Result<()> {
    let _logging_guard = logging::init_daemon(Path::new("keywatch-logs"))?;

    let config = KeywatchConfig::load().context("failed to load configuration")?;

    let webhook_url = config
        .webhook
        .url
        .clone()
        .context("no webhook URL configured; set [webhook].url or KEYWATCH_WEBHOOK_URL")?;

    let automaton =
        keywords::compile(&config.keywords.rules).context("failed to compile keyword rules")?;

    let pipeline = Pipeline::new(automaton, Box::new(WebhookNotifier::new(webhook_url)));
    let mut tailer = LogTailer::new(PathBuf::from(&config.watch.path));

    info!(
        path = %config.watch.path,
        rules = pipeline.pattern_count(),
        poll_interval_secs = config.watch.poll_interval_seconds,
        "keywatch started"
    );

    let poll_interval = Duration::from_secs(config.watch.poll_interval_seconds);
    let retry_interval = Duration::from_secs(config.watch.retry_interval_seconds);

    // Main daemon loop.
    loop {
        match tailer.poll() {
            Ok(lines) => {
                for line in &lines {
                    if let Err(e) = pipeline.handle_line(line).await {
                        warn!(error = %e, "notification delivery failed");
                    }
                }
            }
            Err(e) => warn!(error = %e, "log poll failed"),
        }

        // Poll slowly while attached, quickly while waiting for the file
        // to appear.
        let wait = if tailer.is_attached() {
            poll_interval
        } else {
            retry_interval
        };

        tokio::select! {
            () = tokio::time::sleep(wait) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("received shutdown signal, stopping");
                break;
            }
        }
    }

    Ok(())
}

/// Validate configuration and keyword rules, then exit.
fn handle_check() -> anyhow::Result<()> {
    logging::init_cli();

    let config = KeywatchConfig::load().context("failed to load configuration")?;

    match config.webhook.url.as_deref() {
        Some(raw) => {
            let parsed = Url::parse(raw).context("webhook URL is not a valid URL")?;
            anyhow::ensure!(
                matches!(parsed.scheme(), "http" | "https"),
                "webhook URL must be http or https, found {}",
                parsed.scheme()
            );
            info!("webhook URL OK");
        }
        None => warn!("no webhook URL configured; `keywatch start` will refuse to run"),
    }

    let automaton =
        keywords::compile(&config.keywords.rules).context("failed to compile keyword rules")?;

    if !Path::new(&config.watch.path).exists() {
        warn!(
            path = %config.watch.path,
            "log file does not exist yet (the daemon will wait for it)"
        );
    }

    info!(
        rules = config.keywords.rules.len(),
        nodes = automaton.node_count(),
        path = %config.watch.path,
        "configuration OK"
    );

    Ok(())
}

/// Replay an existing log file through the keyword rules.
async fn handle_scan(file: &Path) -> anyhow::Result<()> {
    logging::init_cli();

    let config = KeywatchConfig::load().context("failed to load configuration")?;
    let automaton =
        keywords::compile(&config.keywords.rules).context("failed to compile keyword rules")?;
    let pipeline = Pipeline::new(automaton, Box::new(StdoutNotifier));

    let reader = std::io::BufReader::new(
        std::fs::File::open(file).with_context(|| format!("failed to open {}", file.display()))?,
    );

    let mut total = 0usize;
    let mut matched = 0usize;
    for line in reader.lines() {
        let line = line.with_context(|| format!("failed to read {}", file.display()))?;
        total = total.saturating_add(1);
        if pipeline.handle_line(&line).await? {
            matched = matched.saturating_add(1);
        }
    }

    info!(total, matched, "scan complete");
    Ok(())
}
