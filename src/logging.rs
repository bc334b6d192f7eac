use std::path::PathBuf;

use color_eyre::Result;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

use crate::config;

lazy_static::lazy_static! {
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

/// Default log location inside the data directory
pub fn default_log_path() -> PathBuf {
    config::get_data_dir().join(LOG_FILE.as_str())
}

/// Initialize logging with custom path and/or level
pub fn init_with(custom_log_path: Option<PathBuf>, level: Option<tracing::Level>) -> Result<()> {
    let log_path = custom_log_path.unwrap_or_else(default_log_path);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let env_filter = env_filter(level);

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let file_subscriber = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::sync::Mutex::new(log_file))
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(())
}

/// An explicit level replaces RUST_LOG; without one RUST_LOG applies on top of WARN.
fn env_filter(level: Option<tracing::Level>) -> EnvFilter {
    let builder = EnvFilter::builder()
        .with_default_directive(level.map_or(LevelFilter::WARN, LevelFilter::from_level).into());
    match level {
        Some(_) => builder.parse_lossy(""),
        None => builder.from_env_lossy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_level_ignores_rust_log() {
        let filter = env_filter(Some(tracing::Level::DEBUG));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
