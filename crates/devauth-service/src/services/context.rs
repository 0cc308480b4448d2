//! Service context - dependency container for services
//!
//! Holds the repositories, collaborators and auth settings needed by services.

use std::future::Future;
use std::sync::Arc;

use devauth_common::{
    AppConfig, Argon2CredentialVerifier, AuthConfig, Sha256Hasher, SystemClock,
};
use devauth_core::traits::{
    Clock, CredentialVerifier, DeviceRepository, FingerprintHasher, RepoResult, TokenRepository,
    UserRepository,
};
use devauth_core::DomainError;
use devauth_db::{
    create_pool, run_migrations, DatabaseConfig, PgDeviceRepository, PgPool, PgTokenRepository,
    PgUserRepository,
};
use devauth_memory::{MemoryDeviceRepository, MemoryTokenRepository, MemoryUserRepository};
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};

/// Service context containing all dependencies
///
/// This is the dependency container that gets passed to all services.
/// It provides access to:
/// - User, device and token repositories
/// - The credential verifier used at login
/// - The clock and fingerprint hasher used to mint and expire tokens
/// - Token validity and storage timeout settings
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    device_repo: Arc<dyn DeviceRepository>,
    token_repo: Arc<dyn TokenRepository>,

    // Collaborators
    verifier: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn FingerprintHasher>,

    // Settings
    auth: AuthConfig,
}

impl ServiceContext {
    /// Start building a context
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    /// Build a context from application configuration
    ///
    /// Uses PostgreSQL when a database is configured and the in-memory
    /// backend otherwise.
    pub async fn from_config(config: &AppConfig) -> ServiceResult<Self> {
        let builder = match &config.database {
            Some(settings) => {
                let pool = create_pool(&DatabaseConfig::from(settings))
                    .await
                    .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
                run_migrations(&pool)
                    .await
                    .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
                info!("Using PostgreSQL storage");
                ServiceContextBuilder::postgres(pool)
            }
            None => {
                info!("DATABASE_URL not set, using in-memory storage");
                ServiceContextBuilder::in_memory()
            }
        };

        builder.auth_config(config.auth.clone()).build()
    }

    // === Repositories ===

    /// Get the user repository
    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    /// Get the device repository
    pub fn device_repo(&self) -> &dyn DeviceRepository {
        self.device_repo.as_ref()
    }

    /// Get the token repository
    pub fn token_repo(&self) -> &dyn TokenRepository {
        self.token_repo.as_ref()
    }

    // === Collaborators ===

    /// Get the credential verifier
    pub fn verifier(&self) -> &dyn CredentialVerifier {
        self.verifier.as_ref()
    }

    /// Get the clock
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Get the fingerprint hasher
    pub fn hasher(&self) -> &dyn FingerprintHasher {
        self.hasher.as_ref()
    }

    /// Get the auth settings
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    /// Run a storage call under the configured deadline
    pub(crate) async fn storage<T, F>(&self, operation: &'static str, call: F) -> ServiceResult<T>
    where
        F: Future<Output = RepoResult<T>>,
    {
        let after = self.auth.storage_timeout();
        match tokio::time::timeout(after, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => {
                warn!(operation, timeout_ms = after.as_millis() as u64, "Storage call timed out");
                Err(ServiceError::Timeout { operation, after })
            }
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("collaborators", &"...")
            .field("auth", &self.auth)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    device_repo: Option<Arc<dyn DeviceRepository>>,
    token_repo: Option<Arc<dyn TokenRepository>>,
    verifier: Option<Arc<dyn CredentialVerifier>>,
    clock: Option<Arc<dyn Clock>>,
    hasher: Option<Arc<dyn FingerprintHasher>>,
    auth: Option<AuthConfig>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded with the in-process repositories
    pub fn in_memory() -> Self {
        let devices = Arc::new(MemoryDeviceRepository::new());
        Self::new()
            .user_repo(Arc::new(MemoryUserRepository::new()))
            .token_repo(Arc::new(MemoryTokenRepository::new(Arc::clone(&devices))))
            .device_repo(devices)
    }

    /// Builder preloaded with PostgreSQL repositories sharing `pool`
    pub fn postgres(pool: PgPool) -> Self {
        Self::new()
            .user_repo(Arc::new(PgUserRepository::new(pool.clone())))
            .device_repo(Arc::new(PgDeviceRepository::new(pool.clone())))
            .token_repo(Arc::new(PgTokenRepository::new(pool)))
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn device_repo(mut self, repo: Arc<dyn DeviceRepository>) -> Self {
        self.device_repo = Some(repo);
        self
    }

    pub fn token_repo(mut self, repo: Arc<dyn TokenRepository>) -> Self {
        self.token_repo = Some(repo);
        self
    }

    pub fn verifier(mut self, verifier: Arc<dyn CredentialVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn hasher(mut self, hasher: Arc<dyn FingerprintHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn auth_config(mut self, auth: AuthConfig) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Build the ServiceContext
    ///
    /// Collaborators default to Argon2 verification against the user
    /// repository, the system clock and SHA-256 fingerprints.
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if a repository is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let user_repo = self
            .user_repo
            .ok_or_else(|| ServiceError::validation("user_repo is required"))?;
        let device_repo = self
            .device_repo
            .ok_or_else(|| ServiceError::validation("device_repo is required"))?;
        let token_repo = self
            .token_repo
            .ok_or_else(|| ServiceError::validation("token_repo is required"))?;

        let verifier = self
            .verifier
            .unwrap_or_else(|| Arc::new(Argon2CredentialVerifier::new(Arc::clone(&user_repo))));

        Ok(ServiceContext {
            user_repo,
            device_repo,
            token_repo,
            verifier,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            hasher: self.hasher.unwrap_or_else(|| Arc::new(Sha256Hasher)),
            auth: self.auth.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_build_requires_repositories() {
        let err = ServiceContextBuilder::new().build().unwrap_err();
        assert_eq!(err.to_string(), "Validation error: user_repo is required");

        let err = ServiceContextBuilder::new()
            .user_repo(Arc::new(MemoryUserRepository::new()))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: device_repo is required");
    }

    #[test]
    fn test_in_memory_uses_default_settings() {
        let ctx = ServiceContextBuilder::in_memory().build().unwrap();
        assert_eq!(ctx.auth().token_validity_secs, 604_800);
        assert_eq!(ctx.auth().storage_timeout(), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_storage_times_out() {
        let auth = AuthConfig {
            storage_timeout_ms: 20,
            ..AuthConfig::default()
        };
        let ctx = ServiceContextBuilder::in_memory().auth_config(auth).build().unwrap();

        let err = ctx
            .storage("slow_call", async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, DomainError>(())
            })
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(err, ServiceError::Timeout { operation: "slow_call", .. }));
    }

    #[tokio::test]
    async fn test_storage_passes_domain_errors_through() {
        let ctx = ServiceContextBuilder::in_memory().build().unwrap();
        let err = ctx
            .storage("lookup", async { Err::<(), _>(DomainError::InvalidDeviceIdentifier) })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidDeviceIdentifier)));
    }

    #[tokio::test]
    async fn test_from_config_without_database_uses_memory() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let ctx = ServiceContext::from_config(&config).await.unwrap();
        assert!(ctx.user_repo().find_by_email("nobody@example.com").await.unwrap().is_none());
    }
}
