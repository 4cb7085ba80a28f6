//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default per-connection input budget; sits well above one message per
/// displayed frame on high refresh rate clients
pub const DEFAULT_INPUT_RATE_LIMIT: u32 = 240;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Players required before a race starts
    pub quorum: usize,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Optional hard cap on race duration (None = races run until finished or abandoned)
    pub race_time_limit: Option<Duration>,
    /// Max inbound client messages per second per connection
    pub input_rate_limit: u32,

    /// Allowed client origins for CORS (empty = no CORS layer)
    pub client_origins: Vec<String>,
    /// Directory served as a static fallback, if any
    pub static_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let quorum: usize = parse_or(&lookup, "QUORUM", 5)?;
        if quorum < 2 {
            return Err(ConfigError::Invalid {
                var: "QUORUM",
                value: quorum.to_string(),
            });
        }

        let tick_rate: u32 = parse_or(&lookup, "TICK_RATE", 60)?;
        if tick_rate == 0 {
            return Err(ConfigError::Invalid {
                var: "TICK_RATE",
                value: "0".to_string(),
            });
        }

        let limit_secs: u64 = parse_or(&lookup, "RACE_TIME_LIMIT_SECS", 0)?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            quorum,
            tick_rate,
            race_time_limit: (limit_secs > 0).then(|| Duration::from_secs(limit_secs)),
            input_rate_limit: parse_or(&lookup, "INPUT_RATE_LIMIT", DEFAULT_INPUT_RATE_LIMIT)?,

            client_origins: lookup("CLIENT_ORIGIN")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from),
        })
    }

    /// Interval between two ticks of one race
    pub fn tick_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.tick_rate as u64)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid server address format")]
    InvalidAddress,
}
