//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sqlx::PgPool;
use tracing::instrument;

use devauth_core::{DomainError, RepoResult, TokenKey, User, UserId, UserRepository};

use crate::mappers::UserInsert;
use crate::models::UserModel;

use super::error::{map_db_error, map_unique_violation, user_not_found};

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Soft-delete a user
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: UserId) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, name, email, time_zone, last_login, last_login_offset, active_token,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(User::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT id, name, email, time_zone, last_login, last_login_offset, active_token,
                   created_at, updated_at, deleted_at
            FROM users
            WHERE email = $1 AND deleted_at IS NULL
            ",
        )
        .bind(User::normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(User::try_from).transpose()
    }

    #[instrument(skip(self, password_hash))]
    async fn create(&self, user: &User, password_hash: &str) -> RepoResult<()> {
        let insert = UserInsert::new(user, password_hash);

        sqlx::query(
            r"
            INSERT INTO users (id, name, email, password_hash, time_zone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(insert.id)
        .bind(insert.name)
        .bind(&insert.email)
        .bind(insert.password_hash)
        .bind(insert.time_zone)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || {
                DomainError::ValidationError(format!("Email already registered: {}", insert.email))
            })
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_password_hash(&self, id: UserId) -> RepoResult<Option<String>> {
        let result = sqlx::query_scalar::<_, String>(
            r"
            SELECT password_hash FROM users WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result)
    }

    #[instrument(skip(self, active_token))]
    async fn record_login(
        &self,
        id: UserId,
        at: DateTime<FixedOffset>,
        active_token: &TokenKey,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET last_login = $2, last_login_offset = $3, active_token = $4, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .bind(at.with_timezone(&Utc))
        .bind(at.offset().local_minus_utc())
        .bind(active_token.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(id));
        }

        Ok(())
    }

    #[instrument(skip(self, key))]
    async fn clear_active_token_if(&self, id: UserId, key: &TokenKey) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET active_token = NULL, updated_at = NOW()
            WHERE id = $1 AND active_token = $2
            ",
        )
        .bind(id.into_inner())
        .bind(key.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
