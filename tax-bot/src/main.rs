use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tax_bot::commands::CommandParser;
use tax_bot::config::BotConfig;
use tax_bot::{ConsoleTransport, Dispatcher, console, logging};
use tax_core::{InMemorySessionStore, SessionFlow};
use tokio::io::BufReader;
use tracing::{debug, info, warn};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Chat assistant for pixel load times and income tax estimates.
///
/// Reads `<user>: <message>` lines from stdin and writes the bot's replies
/// to stdout. Logs go to stderr.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `info,tax_core=trace`.
    #[arg(long)]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// CSV with the annual and monthly bracket schedules.
    #[arg(long)]
    brackets: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file, then applies command-line overrides on top.
    fn into_config(self) -> Result<BotConfig> {
        let mut config = match &self.config {
            Some(path) => BotConfig::load(path)?,
            None => BotConfig::default(),
        };

        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(file) = self.log_file {
            config.logging.file = Some(file);
        }
        if let Some(brackets) = self.brackets {
            config.tax.brackets_file = Some(brackets);
        }
        Ok(config)
    }
}

// ─── idle sweep ──────────────────────────────────────────────────────────────

fn spawn_idle_sweep(
    flow: Arc<SessionFlow>,
    config: &BotConfig,
) -> Result<()> {
    let Some(idle_timeout) = config.idle_timeout() else {
        info!("idle questionnaire eviction disabled");
        return Ok(());
    };
    let max_idle = chrono::Duration::from_std(idle_timeout)
        .context("sessions.idle_timeout_secs is too large")?;
    let every = config.sweep_interval();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = flow.evict_idle(max_idle);
            debug!(evicted, active = flow.active_sessions(), "idle sweep finished");
        }
    });
    Ok(())
}

/// Resolves on ctrl-c. Never resolves if the signal cannot be installed.
async fn interrupted() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;
    logging::init_logging(&config.logging)?;

    let calculator = config
        .build_calculator()
        .context("failed to build the income tax calculator")?;
    let flow = Arc::new(SessionFlow::new(InMemorySessionStore::new(), calculator));
    spawn_idle_sweep(Arc::clone(&flow), &config)?;

    let commands = CommandParser::new(&config.command_prefix)
        .with_context(|| format!("invalid command prefix {:?}", config.command_prefix))?;
    let dispatcher = Dispatcher::new(flow, commands, ConsoleTransport::stdout());

    info!(prefix = %config.command_prefix, "bot ready, reading messages from stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        handled = console::run(stdin, &dispatcher) => {
            let handled = handled.context("failed reading stdin")?;
            info!(handled, "input closed, shutting down");
        }
        () = interrupted() => {
            info!(active = dispatcher.flow().active_sessions(), "interrupted, shutting down");
        }
    }

    Ok(())
}
