//! Tracing setup and the persistent activity log.
//!
//! Events go to stderr and, when a log file is available, to an append-only
//! file in the form `YYYY-MM-DD HH:MM:SS - LEVEL - message`.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use crate::error::LogError;

/// Timestamp format of log lines.
pub const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats events as `timestamp - LEVEL - message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "{} - {} - ",
            Local::now().format(LOG_TIME_FORMAT),
            level_name(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn level_name(level: &Level) -> &'static str {
    if *level == Level::WARN {
        "WARNING"
    } else {
        level.as_str()
    }
}

/// Opens `path` for appending, creating it when missing.
pub fn open_log_file(path: impl AsRef<Path>) -> Result<File, LogError> {
    let path = path.as_ref();
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LogError::Unavailable {
            path: path.to_path_buf(),
            source,
        })
}

/// Installs the global subscriber.
///
/// `filter` is used unless `RUST_LOG` is set. With a log file the console
/// only shows warnings and errors; without one it shows everything the
/// filter lets through.
pub fn init(filter: &str, log_file: Option<File>) -> Result<(), LogError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let console_level = if log_file.is_some() {
        LevelFilter::WARN
    } else {
        LevelFilter::TRACE
    };

    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .event_format(LineFormat)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_level),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| LogError::AlreadyInitialized(e.to_string()))
}

/// Reads the whole log file. A missing file reads as empty.
pub async fn read_log(path: impl AsRef<Path>) -> Result<String, LogError> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(LogError::Unavailable {
            path: path.to_path_buf(),
            source,
        }),
    }
}
