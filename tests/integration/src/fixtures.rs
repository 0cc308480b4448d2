//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::OnceLock;

use chrono::Utc;
use devauth_core::{User, UserId};
use devauth_service::LoginRequest;

/// Password every fixture account is created with
pub const TEST_PASSWORD: &str = "TestPass123!";

/// Get a unique suffix for test data
///
/// Seeded from the wall clock so rows left in a shared database by earlier
/// runs never collide.
pub fn unique_suffix() -> i64 {
    static COUNTER: OnceLock<AtomicI64> = OnceLock::new();
    COUNTER
        .get_or_init(|| AtomicI64::new(Utc::now().timestamp_micros()))
        .fetch_add(1, Ordering::SeqCst)
}

/// An account to register before logging in
#[derive(Debug, Clone)]
pub struct TestAccount {
    pub user: User,
    pub password: String,
}

impl TestAccount {
    pub fn unique() -> Self {
        let suffix = unique_suffix();
        Self {
            user: User::new(
                UserId::new(suffix),
                format!("testuser{suffix}"),
                &format!("Test{suffix}@Example.com"),
            ),
            password: TEST_PASSWORD.to_string(),
        }
    }

    #[must_use]
    pub fn with_time_zone(mut self, time_zone: &str) -> Self {
        self.user = self.user.with_time_zone(time_zone);
        self
    }

    /// Login request for this account from `device_id`
    pub fn login_request(&self, device_id: &str) -> LoginRequest {
        LoginRequest::new(self.user.email.clone(), self.password.clone(), device_id)
    }
}
