//! Lifecycle outcomes - results callers must match exhaustively

mod lifecycle;

pub use lifecycle::{LogoutOutcome, Validation};
