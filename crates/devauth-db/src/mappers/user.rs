//! User entity <-> model mapper

use chrono::{FixedOffset, Offset, Utc};
use devauth_core::{DomainError, TokenKey, User, UserId};

use crate::models::UserModel;

/// Convert UserModel to User entity
///
/// Fails only if the stored active-token reference is not a well-formed key.
impl TryFrom<UserModel> for User {
    type Error = DomainError;

    fn try_from(model: UserModel) -> Result<Self, Self::Error> {
        let is_deleted = model.is_deleted();
        let offset = model
            .last_login_offset
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());

        Ok(User {
            id: UserId::new(model.id),
            name: model.name,
            email: model.email,
            time_zone: model.time_zone,
            last_login: model.last_login.map(|at| at.with_timezone(&offset)),
            active_token: model.active_token.as_deref().map(TokenKey::parse).transpose()?,
            is_deleted,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Convert User entity reference to values for database insertion
pub struct UserInsert<'a> {
    pub id: i64,
    pub name: &'a str,
    pub email: String,
    pub password_hash: &'a str,
    pub time_zone: Option<&'a str>,
}

impl<'a> UserInsert<'a> {
    pub fn new(user: &'a User, password_hash: &'a str) -> Self {
        Self {
            id: user.id.into_inner(),
            name: &user.name,
            email: User::normalize_email(&user.email),
            password_hash,
            time_zone: user.time_zone.as_deref(),
        }
    }
}
