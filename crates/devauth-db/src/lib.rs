//! # devauth-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for the repository traits
//! defined in `devauth-core`. It handles:
//!
//! - Connection pool management and schema setup
//! - Database models with SQLx `FromRow` derives
//! - Entity ↔ Model mappers
//! - Repository implementations, including the transactional issue-or-rotate
//!
//! ## Usage
//!
//! ```rust,ignore
//! use devauth_db::pool::{create_pool, run_migrations, DatabaseConfig};
//! use devauth_db::repositories::PgTokenRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::default();
//!     let pool = create_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     let token_repo = PgTokenRepository::new(pool);
//!
//!     // Use the repository...
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{PgDeviceRepository, PgTokenRepository, PgUserRepository};
