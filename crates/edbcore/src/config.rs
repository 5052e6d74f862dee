//! # Client Configuration
//!
//! Where the server lives and how the client reports on itself. Values come
//! from the environment; anything unset falls back to a default.
//!
//! | Variable          | Default     |
//! |-------------------|-------------|
//! | `EDB_SERVER_HOST` | `localhost` |
//! | `EDB_SERVER_PORT` | `50051`     |
//! | `EDB_COUNT_RPCS`  | `false`     |
//! | `EDB_LOG_LEVEL`   | `info`      |
//! | `EDB_LOG_STDOUT`  | `true`      |
//! | `EDB_LOG_FILE`    | unset       |

use std::path::PathBuf;

use crate::error::Error;
use crate::error::Result;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 50051;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// An `EnvFilter` directive, e.g. `info` or `edbcore=debug`.
    pub level: String,
    pub to_stdout: bool,
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), to_stdout: true, file: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub count_rpcs: bool,
    pub log: LogConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { host: DEFAULT_HOST.to_string(), port: DEFAULT_PORT, count_rpcs: false, log: LogConfig::default() }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: lookup("EDB_SERVER_HOST").unwrap_or(defaults.host),
            port: match lookup("EDB_SERVER_PORT") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| Error::Config(format!("EDB_SERVER_PORT must be a port number, got '{}'", raw)))?,
                None => defaults.port,
            },
            count_rpcs: parse_flag("EDB_COUNT_RPCS", lookup("EDB_COUNT_RPCS"), defaults.count_rpcs)?,
            log: LogConfig {
                level: lookup("EDB_LOG_LEVEL").unwrap_or(defaults.log.level),
                to_stdout: parse_flag("EDB_LOG_STDOUT", lookup("EDB_LOG_STDOUT"), defaults.log.to_stdout)?,
                file: lookup("EDB_LOG_FILE").filter(|p| !p.is_empty()).map(PathBuf::from),
            },
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(name: &str, raw: Option<String>, default: bool) -> Result<bool> {
    let Some(raw) = raw else { return Ok(default) };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean, got '{}'", name, raw))),
    }
}
