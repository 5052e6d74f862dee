//! # Logging
//!
//! Installs the global `tracing` subscriber for applications built on the
//! client. Library code only emits events; it never installs a subscriber on
//! its own.

use std::fs::File;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogConfig;
use crate::error::Error;
use crate::error::Result;

/// Installs a subscriber writing to stdout and/or a file.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. Fails if a
/// global subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| Error::Logging(format!("invalid log level '{}': {}", config.level, e)))?,
    };

    let stdout = config.to_stdout.then(|| fmt::layer());
    let file = match &config.file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| Error::Logging(format!("cannot open {}: {}", path.display(), e)))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
