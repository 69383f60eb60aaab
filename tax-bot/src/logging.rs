use anyhow::{Context, Result};
use chrono::Local;
use std::{
    fs::File,
    io::{self, IsTerminal},
    sync::Mutex,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

// --- Formatter ---

/// `<local time> <LEVEL> <target>: <fields>`, colored when the writer allows.
struct LocalFmt;

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "1;31",
        Level::WARN => "1;33",
        Level::INFO => "1;32",
        Level::DEBUG => "1;34",
        Level::TRACE => "1;35",
    }
}

/// Writes `text` wrapped in an SGR sequence when `ansi` is set.
fn paint(
    writer: &mut Writer<'_>,
    ansi: bool,
    sgr: &str,
    text: impl std::fmt::Display,
) -> std::fmt::Result {
    if ansi {
        write!(writer, "\x1b[{sgr}m{text}\x1b[0m ")
    } else {
        write!(writer, "{text} ")
    }
}

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        paint(&mut writer, ansi, "2", now)?;
        paint(&mut writer, ansi, level_color(meta.level()), format_args!("{:>5}", meta.level()))?;
        paint(&mut writer, ansi, "36", format_args!("{}:", meta.target()))?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// `RUST_LOG` when set, otherwise the configured directive.
fn make_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{level}'")),
    }
}

/// Initializes logging. Call once at startup.
///
/// - Stderr: colored when attached to a terminal, plain when piped. Stdout
///   belongs to the console transport.
/// - File: appended to when `config.file` is set.
/// - Level: `config.level`, overridden by the RUST_LOG env var.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = make_filter(&config.level)?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    let file_layer = match &config.file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file '{}'", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .event_format(LocalFmt)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")
}
