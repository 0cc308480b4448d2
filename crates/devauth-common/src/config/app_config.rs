//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration as StdDuration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    /// `None` selects the in-process storage backend
    pub database: Option<DatabaseConfig>,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Token lifecycle settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Validity window of an issued or rotated token, in seconds
    #[serde(default = "default_token_validity_secs")]
    pub token_validity_secs: i64,
    /// Upper bound on any single storage call, in milliseconds
    #[serde(default = "default_storage_timeout_ms")]
    pub storage_timeout_ms: u64,
}

impl AuthConfig {
    /// Validity window as a chrono duration
    #[must_use]
    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.token_validity_secs)
    }

    /// Storage deadline as a std duration
    #[must_use]
    pub fn storage_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.storage_timeout_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_validity_secs: default_token_validity_secs(),
            storage_timeout_ms: default_storage_timeout_ms(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub format: LogFormat,
}

// Default value functions
fn default_app_name() -> String {
    "devauth".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_token_validity_secs() -> i64 {
    604_800 // 7 days
}

fn default_storage_timeout_ms() -> u64 {
    5_000
}

/// Parse an optional variable, rejecting values that are present but malformed
fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        None => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = match lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_var(&lookup, "DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: parse_var(&lookup, "DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
            }),
            None => None,
        };

        let token_validity_secs: i64 = parse_var(&lookup, "TOKEN_VALIDITY_SECS")?
            .unwrap_or_else(default_token_validity_secs);
        if token_validity_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "TOKEN_VALIDITY_SECS",
                token_validity_secs.to_string(),
            ));
        }

        let format = match lookup("LOG_FORMAT").map(|s| s.trim().to_lowercase()) {
            None => LogFormat::default(),
            Some(s) if s == "pretty" => LogFormat::Pretty,
            Some(s) if s == "json" => LogFormat::Json,
            Some(other) => return Err(ConfigError::InvalidValue("LOG_FORMAT", other)),
        };

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: parse_var(&lookup, "APP_ENV")?.unwrap_or_default(),
            },
            database,
            auth: AuthConfig {
                token_validity_secs,
                storage_timeout_ms: parse_var(&lookup, "TOKEN_STORAGE_TIMEOUT_MS")?
                    .unwrap_or_else(default_storage_timeout_ms),
            },
            log: LogConfig { format },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
