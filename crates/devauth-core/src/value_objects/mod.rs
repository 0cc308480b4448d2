//! Value objects - immutable types that represent domain concepts

mod ids;
mod token_key;

pub use ids::{DeviceId, IdParseError, UserId};
pub use token_key::{TokenKey, TokenKeyError};
