//! Entity to model mappers
//!
//! This module provides conversions between domain entities (devauth-core) and database models.
//! - `From<Model>`/`TryFrom<Model> for Entity`: Convert database rows to domain objects
//! - `*Insert` structs: Prepare entity data for database operations

mod device;
mod token;
mod user;

pub use user::UserInsert;
