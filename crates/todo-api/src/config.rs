//! Runtime configuration read from environment variables.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    time::Duration,
};

use thiserror::Error;

/// A variable was set but could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Output format of the log subscriber (`LOG_FORMAT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen address, from `BIND_ADDR` and `PORT`.
    pub bind_addr: SocketAddr,
    /// SQLite database file (`DATABASE_PATH`).
    pub database_path: PathBuf,
    /// How long a connection waits on a locked database (`DB_BUSY_TIMEOUT_MS`).
    pub db_busy_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads `PORT`, `BIND_ADDR`, `DATABASE_PATH`, `DB_BUSY_TIMEOUT_MS` and
    /// `LOG_FORMAT`. Unset variables fall back to local-development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let ip: IpAddr = parse_or(&lookup, "BIND_ADDR", IpAddr::V4(Ipv4Addr::LOCALHOST))?;
        let busy_ms: u64 = parse_or(&lookup, "DB_BUSY_TIMEOUT_MS", 5000)?;
        let log_format = parse_or(&lookup, "LOG_FORMAT", LogFormat::Text)?;

        Ok(Config {
            bind_addr: SocketAddr::new(ip, port),
            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("todos.db")),
            db_busy_timeout: Duration::from_millis(busy_ms),
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
