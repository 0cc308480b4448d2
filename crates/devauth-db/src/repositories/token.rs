//! PostgreSQL implementation of TokenRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use devauth_core::{
    Binding, DeviceId, DomainError, IssueOutcome, IssueRequest, RepoResult, Token, TokenKey,
    TokenRepository, UserId,
};

use crate::models::{BindingModel, TokenModel};

use super::error::{map_db_error, map_unique_violation};

const SELECT_TOKEN: &str = r"
    SELECT t.token_key, t.user_id, t.device_id, d.identifier AS device_identifier,
           t.issued_at, t.expires_at, t.epoch
    FROM tokens t
    JOIN devices d ON d.id = t.device_id
";

fn key_collision() -> DomainError {
    DomainError::StorageConflict("token key already in use".to_string())
}

/// PostgreSQL implementation of TokenRepository
#[derive(Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
}

impl PgTokenRepository {
    /// Create a new PgTokenRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    #[instrument(skip(self, request), fields(user_id = %request.user_id, device_id = %request.device_id))]
    async fn issue_or_rotate(&self, request: &IssueRequest) -> RepoResult<IssueOutcome> {
        // Dropping the transaction before commit rolls everything back
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let binding = sqlx::query_as::<_, BindingModel>(
            "SELECT device_id, epoch FROM device_bindings WHERE user_id = $1",
        )
        .bind(request.user_id.into_inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?
        .map(Binding::from)
        .filter(|b| b.device_id == request.device_id)
        .ok_or(DomainError::DeviceNotCurrent(request.device_id))?;

        // The (user_id, device_id) constraint lets exactly one concurrent insert win;
        // losers wait for it to commit and then fall through to the locked read.
        let fresh = request.new_token(binding.epoch);
        let inserted = sqlx::query(
            r"
            INSERT INTO tokens (token_key, user_id, device_id, issued_at, expires_at, epoch)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, device_id) DO NOTHING
            ",
        )
        .bind(fresh.key.as_str())
        .bind(fresh.user_id.into_inner())
        .bind(fresh.device_id.into_inner())
        .bind(fresh.issued_at)
        .bind(fresh.expires_at)
        .bind(fresh.epoch)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, key_collision))?;

        if inserted.rows_affected() == 1 {
            tx.commit().await.map_err(map_db_error)?;
            debug!(epoch = binding.epoch, "Inserted token");
            return Ok(IssueOutcome::created(fresh));
        }

        let existing = sqlx::query_as::<_, TokenModel>(&format!(
            "{SELECT_TOKEN} WHERE t.user_id = $1 AND t.device_id = $2 FOR UPDATE OF t"
        ))
        .bind(request.user_id.into_inner())
        .bind(request.device_id.into_inner())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| {
            DomainError::StorageConflict("token row vanished during issue".to_string())
        })?;
        let existing = Token::try_from(existing)?;

        let outcome = request.resolve(Some(&existing), binding.epoch);
        if outcome.token == existing {
            tx.commit().await.map_err(map_db_error)?;
            return Ok(outcome);
        }

        // Stale-epoch replacement and expiry rotation both overwrite the row in place
        sqlx::query(
            r"
            UPDATE tokens
            SET token_key = $3, issued_at = $4, expires_at = $5, epoch = $6
            WHERE user_id = $1 AND device_id = $2
            ",
        )
        .bind(request.user_id.into_inner())
        .bind(request.device_id.into_inner())
        .bind(outcome.token.key.as_str())
        .bind(outcome.token.issued_at)
        .bind(outcome.token.expires_at)
        .bind(outcome.token.epoch)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, key_collision))?;

        tx.commit().await.map_err(map_db_error)?;
        debug!(
            epoch = outcome.token.epoch,
            created = outcome.was_created,
            rotated = outcome.was_rotated,
            "Replaced token"
        );

        Ok(outcome)
    }

    #[instrument(skip(self, key), fields(key = %key.fingerprint()))]
    async fn find_by_key(&self, key: &TokenKey) -> RepoResult<Option<Token>> {
        let result = sqlx::query_as::<_, TokenModel>(&format!("{SELECT_TOKEN} WHERE t.token_key = $1"))
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        result.map(Token::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_pair(&self, user_id: UserId, device_id: DeviceId) -> RepoResult<Option<Token>> {
        let result = sqlx::query_as::<_, TokenModel>(&format!(
            "{SELECT_TOKEN} WHERE t.user_id = $1 AND t.device_id = $2"
        ))
        .bind(user_id.into_inner())
        .bind(device_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Token::try_from).transpose()
    }

    #[instrument(skip(self, key), fields(key = %key.fingerprint()))]
    async fn delete_by_key(&self, key: &TokenKey) -> RepoResult<Option<Token>> {
        let result = sqlx::query_as::<_, TokenModel>(
            r"
            WITH removed AS (
                DELETE FROM tokens WHERE token_key = $1
                RETURNING token_key, user_id, device_id, issued_at, expires_at, epoch
            )
            SELECT r.token_key, r.user_id, r.device_id, d.identifier AS device_identifier,
                   r.issued_at, r.expires_at, r.epoch
            FROM removed r
            JOIN devices d ON d.id = r.device_id
            ",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Token::try_from).transpose()
    }
}
