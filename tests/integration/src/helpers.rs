//! Test helpers for integration tests
//!
//! Provides a ready-to-use service context with a controllable clock and
//! shortcuts for registering accounts and logging in.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, DurationRound, Utc};
use devauth_common::{
    hash_password, try_init_tracing_with_config, AppConfig, AuthConfig, TracingConfig,
};
use devauth_core::TokenKey;
use devauth_db::{create_pool, run_migrations, DatabaseConfig};
use devauth_memory::ManualClock;
use devauth_service::{
    AuthService, DeviceRegistry, LoginResponse, ServiceContext, ServiceContextBuilder, TokenStore,
};

use crate::fixtures::TestAccount;

/// Service context plus the clock driving it
pub struct TestApp {
    pub ctx: ServiceContext,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// Start on the in-memory backend with default settings
    pub fn start() -> Result<Self> {
        Self::start_with_auth(AuthConfig::default())
    }

    /// Start on the in-memory backend with custom auth settings
    pub fn start_with_auth(auth: AuthConfig) -> Result<Self> {
        Self::from_builder(ServiceContextBuilder::in_memory().auth_config(auth))
    }

    /// Start on PostgreSQL, or `None` when no database is configured
    pub async fn start_postgres() -> Result<Option<Self>> {
        dotenvy::dotenv().ok();
        let config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {e}"))?;
        let Some(settings) = config.database.as_ref() else {
            eprintln!("Skipping PostgreSQL run: DATABASE_URL not set");
            return Ok(None);
        };

        let pool = create_pool(&DatabaseConfig::from(settings)).await?;
        run_migrations(&pool).await?;
        Self::from_builder(ServiceContextBuilder::postgres(pool).auth_config(config.auth)).map(Some)
    }

    fn from_builder(builder: ServiceContextBuilder) -> Result<Self> {
        init_test_tracing();

        // PostgreSQL keeps microseconds; start on a boundary so instants survive a round trip
        let start = Utc::now().duration_trunc(Duration::microseconds(1))?;
        let clock = Arc::new(ManualClock::new(start));
        let ctx = builder.clock(clock.clone()).build()?;
        Ok(Self { ctx, clock })
    }

    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.ctx)
    }

    pub fn tokens(&self) -> TokenStore<'_> {
        TokenStore::new(&self.ctx)
    }

    pub fn devices(&self) -> DeviceRegistry<'_> {
        DeviceRegistry::new(&self.ctx)
    }

    /// Persist `account` with an Argon2 hash of its password
    pub async fn register(&self, account: &TestAccount) -> Result<()> {
        let hash = hash_password(&account.password)?;
        self.ctx.user_repo().create(&account.user, &hash).await?;
        Ok(())
    }

    /// Register a fresh unique account
    pub async fn create_account(&self) -> Result<TestAccount> {
        let account = TestAccount::unique();
        self.register(&account).await?;
        Ok(account)
    }

    /// Log `account` in from `device_id`
    pub async fn login(&self, account: &TestAccount, device_id: &str) -> Result<LoginResponse> {
        Ok(self.auth().login(account.login_request(device_id)).await?)
    }
}

/// Parse the key out of a login response
pub fn token_key(response: &LoginResponse) -> Result<TokenKey> {
    Ok(TokenKey::parse(&response.token)?)
}

/// Install a subscriber once for the whole test binary; later calls are no-ops
pub fn init_test_tracing() {
    let _ = try_init_tracing_with_config(TracingConfig::development());
}
