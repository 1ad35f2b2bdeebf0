//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use thiserror::Error;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A variable that is set but cannot be parsed.
#[derive(Debug, Error)]
#[error("invalid value for {name}: {value:?}")]
pub struct ConfigError {
    pub name: &'static str,
    pub value: String,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: Postgres connection string; unset runs on the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `10`)
/// - `INVOICE_DIR`: directory invoices are written to (default: `"invoices"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub invoice_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let log_format = match lookup("LOG_FORMAT") {
            None => defaults.log_format,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(value) => {
                return Err(ConfigError {
                    name: "LOG_FORMAT",
                    value,
                });
            }
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT")?.unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.database_max_connections),
            invoice_dir: lookup("INVOICE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.invoice_dir),
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(name)
        .map(|value| value.parse().map_err(|_| ConfigError { name, value }))
        .transpose()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 10,
            invoice_dir: PathBuf::from("invoices"),
        }
    }
}
