//! Logging setup: a colored console sink plus a daily-rolling file sink,
//! the same `fern` + `tracing-appender` pairing the engine's sibling CLI
//! crates use.

use std::io::{BufWriter, Write};
use std::str::FromStr;

use anyhow::Result;
use log::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

const MAX_LOG_FILES: usize = 10;

/// Installs the global logger. The returned guard must be held for the
/// lifetime of the process -- dropping it flushes and stops the
/// background writer thread.
pub fn init_logging(dir: &str, level: &str) -> Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;

    let rolling = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("node-cli.log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(rolling);
    let buffered = BufWriter::with_capacity(64 * 1024, non_blocking);

    let file_dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] - {} - [{}] {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::from_str(level)?)
        .chain(Box::new(buffered) as Box<dyn Write + Send>);

    let console_dispatch = fern::Dispatch::new()
        .level(LevelFilter::from_str(level)?)
        .format(|out, message, record| {
            out.finish(format_args!("{} {}", colorize_level(record.level()), message))
        })
        .chain(std::io::stderr());

    fern::Dispatch::new().chain(file_dispatch).chain(console_dispatch).apply()?;

    Ok(guard)
}

fn colorize_level(level: log::Level) -> colored::ColoredString {
    use colored::Colorize;
    match level {
        log::Level::Error => "ERROR".red().bold(),
        log::Level::Warn => "WARN".yellow(),
        log::Level::Info => "INFO".green(),
        log::Level::Debug => "DEBUG".blue(),
        log::Level::Trace => "TRACE".normal(),
    }
}
