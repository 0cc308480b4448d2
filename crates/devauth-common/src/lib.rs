//! # devauth-common
//!
//! Shared utilities including configuration, error handling, default
//! authentication collaborators, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    hash_password, parse_authorization_header, verify_password, Argon2CredentialVerifier,
    AuthHeaderError, Sha256Hasher, SystemClock, TOKEN_SCHEME,
};
pub use config::{
    AppConfig, AppSettings, AuthConfig, ConfigError, DatabaseConfig, Environment, LogConfig,
    LogFormat,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
