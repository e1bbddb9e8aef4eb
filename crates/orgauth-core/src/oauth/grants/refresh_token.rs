//! `refresh_token` grant.
//!
//! Refresh tokens are not rotated: the response carries the same refresh
//! token the client presented.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::grant::{GrantHandler, TokenContext};
use crate::oauth::token::TokenResponse;
use crate::token::TokenService;

/// Mints access tokens from a live refresh token.
pub struct RefreshTokenGrant {
    token_service: Arc<TokenService>,
}

impl RefreshTokenGrant {
    #[must_use]
    pub fn new(token_service: Arc<TokenService>) -> Self {
        Self { token_service }
    }
}

#[async_trait]
impl GrantHandler for RefreshTokenGrant {
    fn grant_type(&self) -> &'static str {
        "refresh_token"
    }

    async fn handle(&self, ctx: &TokenContext) -> AuthResult<TokenResponse> {
        let refresh_token = ctx
            .request
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::invalid_refresh_token("refresh_token is required"))?;

        let record = self.token_service.validate_refresh_token(refresh_token).await?;

        if record.client_id != ctx.client_id || record.organization_id != ctx.organization.id {
            return Err(AuthError::invalid_refresh_token(
                "token was issued to a different client",
            ));
        }

        let access_token = self.token_service.generate_access_token(&record.subject)?;
        tracing::debug!(
            client_id = %ctx.client_id,
            organization = %ctx.organization.name,
            jti = %record.jti,
            "access token refreshed"
        );

        Ok(
            TokenResponse::new(access_token, self.token_service.access_token_expires_in())
                .with_refresh_token(refresh_token.to_string()),
        )
    }
}
