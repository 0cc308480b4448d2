//! Integration test utilities for device-bound authentication
//!
//! This crate provides helpers for running end-to-end login, validation and
//! logout scenarios against the in-memory backend, and against PostgreSQL
//! when `DATABASE_URL` is set.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
