//! Subscriber setup shared by the server and the CLI.
//!
//! Console output always goes through a `fmt` layer. With a log directory
//! configured, a second plain-text layer writes to a daily rolling file that
//! keeps the most recent [`MAX_LOG_FILES`] files.
use std::path::Path;

use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

pub const LOG_FILE_PREFIX: &str = "comfyui-tools";
pub const MAX_LOG_FILES: usize = 5;

pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}

/// Install the global subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init(default_filter: &str, console: BoxMakeWriter, log_dir: Option<&Path>) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let file_layer = match log_dir {
        Some(dir) => Some(fmt::layer().with_ansi(false).with_writer(file_appender(dir)?)),
        None => None,
    };

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(console))
        .with(file_layer)
        .init();

    if let Some(dir) = log_dir {
        tracing::info!(dir = %dir.display(), "Writing rolling log files");
    }
    Ok(())
}
