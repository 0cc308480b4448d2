//! Authentication service
//!
//! Handles login, token validation, logout and header-based authentication.
//! Expired and device-changed tokens are deleted the moment they are seen.

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use devauth_common::parse_authorization_header;
use devauth_core::{LogoutOutcome, Token, TokenKey, User, Validation};
use tracing::{debug, info, instrument, warn};
use validator::Validate;

use crate::dto::{LoginRequest, LoginResponse};

use super::context::ServiceContext;
use super::device::DeviceRegistry;
use super::error::{ServiceError, ServiceResult};
use super::token::TokenStore;

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Login with email and password from a specific device
    ///
    /// Repeating a login from the same device within the validity window
    /// returns the same token.
    #[instrument(skip(self, request), fields(email = %request.email, device_id = %request.device.device_id))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<LoginResponse> {
        request.validate()?;

        let email = User::normalize_email(&request.email);
        let user = self
            .ctx
            .storage("find_by_email", self.ctx.user_repo().find_by_email(&email))
            .await?
            .ok_or_else(|| {
                warn!(email = %email, "Login failed: user not found");
                ServiceError::InvalidCredentials
            })?;

        let matched = self
            .ctx
            .storage("verify", self.ctx.verifier().verify(user.id, &request.password))
            .await?;
        if !matched {
            warn!(user_id = %user.id, "Login failed: invalid password");
            return Err(ServiceError::InvalidCredentials);
        }

        let device = DeviceRegistry::new(self.ctx)
            .bind(
                user.id,
                &request.device.device_id,
                request.device.os,
                request.device.os_version,
            )
            .await?;

        let outcome = TokenStore::new(self.ctx).issue_or_rotate(&user, &device).await?;

        let at = self.login_time(&user);
        self.ctx
            .storage(
                "record_login",
                self.ctx.user_repo().record_login(user.id, at, &outcome.token.key),
            )
            .await?;

        info!(
            user_id = %user.id,
            device_id = %device.id,
            created = outcome.was_created,
            rotated = outcome.was_rotated,
            "User logged in successfully"
        );

        let user = User {
            last_login: Some(at),
            active_token: Some(outcome.token.key.clone()),
            ..user
        };
        Ok(LoginResponse::new(&outcome, &user))
    }

    /// Classify a presented key
    ///
    /// Never renews a token. Every non-valid outcome except `NotFound` for an
    /// unknown key leaves the row deleted.
    #[instrument(skip(self, key), fields(key = key.fingerprint()))]
    pub async fn validate_token(&self, key: &TokenKey) -> ServiceResult<Validation> {
        let tokens = TokenStore::new(self.ctx);
        let Some(token) = tokens.lookup(key).await? else {
            return Ok(Validation::NotFound);
        };

        if TokenStore::is_expired(&token, self.ctx.clock().now()) {
            tokens.remove(key).await?;
            self.release(&token).await?;
            warn!(user_id = %token.user_id, "Expired token removed");
            return Ok(Validation::Expired);
        }

        // Epochs only grow, so a token seen here as unbound can never be reused by a later login
        let still_bound = DeviceRegistry::new(self.ctx).still_bound(&token).await?;
        if !still_bound {
            tokens.remove(key).await?;
            self.release(&token).await?;
            warn!(
                user_id = %token.user_id,
                device = %token.device_identifier,
                "Token presented from a device that is no longer current"
            );
            return Ok(Validation::DeviceChanged);
        }

        let user = self
            .ctx
            .storage("find_by_id", self.ctx.user_repo().find_by_id(token.user_id))
            .await?;
        match user {
            Some(user) => Ok(Validation::Valid { user, token }),
            None => {
                tokens.remove(key).await?;
                warn!(user_id = %token.user_id, "Token owner no longer exists");
                Ok(Validation::NotFound)
            }
        }
    }

    /// Revoke a token; a repeated logout reports `NotFound`
    #[instrument(skip(self, key), fields(key = key.fingerprint()))]
    pub async fn logout(&self, key: &TokenKey) -> ServiceResult<LogoutOutcome> {
        match TokenStore::new(self.ctx).remove(key).await? {
            Some(token) => {
                self.release(&token).await?;
                info!(user_id = %token.user_id, "User logged out");
                Ok(LogoutOutcome::Revoked)
            }
            None => {
                debug!("Logout for unknown token");
                Ok(LogoutOutcome::NotFound)
            }
        }
    }

    /// Authenticate from a raw `Authorization` header value
    pub async fn authenticate(&self, header: Option<&str>) -> ServiceResult<Validation> {
        let raw = parse_authorization_header(header).map_err(|e| {
            debug!(reason = %e, "Rejected Authorization header");
            ServiceError::Unauthenticated
        })?;

        match TokenKey::parse(raw) {
            Ok(key) => self.validate_token(&key).await,
            Err(_) => Ok(Validation::NotFound),
        }
    }

    /// Resolve the user behind a key, failing for every non-valid outcome
    pub async fn current_user(&self, key: &TokenKey) -> ServiceResult<User> {
        match self.validate_token(key).await? {
            Validation::Valid { user, .. } => Ok(user),
            Validation::Expired => Err(ServiceError::TokenExpired),
            Validation::DeviceChanged => Err(ServiceError::DeviceChanged),
            Validation::NotFound => Err(ServiceError::InvalidToken),
        }
    }

    /// Drop the owner's active-token reference if it still points at `token`
    async fn release(&self, token: &Token) -> ServiceResult<()> {
        self.ctx
            .storage(
                "clear_active_token_if",
                self.ctx.user_repo().clear_active_token_if(token.user_id, &token.key),
            )
            .await?;
        Ok(())
    }

    /// Current time in the user's zone, UTC when unset or unknown
    fn login_time(&self, user: &User) -> DateTime<FixedOffset> {
        let now = self.ctx.clock().now();
        match user.time_zone.as_deref().and_then(|tz| tz.parse::<Tz>().ok()) {
            Some(tz) => now.with_timezone(&tz).fixed_offset(),
            None => now.fixed_offset(),
        }
    }
}
