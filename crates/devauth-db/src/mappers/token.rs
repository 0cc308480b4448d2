//! Token entity <-> model mapper

use devauth_core::{DeviceId, DomainError, Token, TokenKey, UserId};

use crate::models::TokenModel;

impl TryFrom<TokenModel> for Token {
    type Error = DomainError;

    fn try_from(model: TokenModel) -> Result<Self, Self::Error> {
        Ok(Token {
            key: TokenKey::parse(&model.token_key)?,
            user_id: UserId::new(model.user_id),
            device_id: DeviceId::new(model.device_id),
            device_identifier: model.device_identifier,
            issued_at: model.issued_at,
            expires_at: model.expires_at,
            epoch: model.epoch,
        })
    }
}
