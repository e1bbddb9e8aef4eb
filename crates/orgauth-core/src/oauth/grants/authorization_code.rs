//! `authorization_code` grant.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::cache::ContextCache;
use crate::error::AuthError;
use crate::oauth::grant::{GrantHandler, TokenContext};
use crate::oauth::pkce::{CodeChallengeMethod, verify_code_verifier};
use crate::oauth::token::TokenResponse;
use crate::token::TokenService;

/// Redeems a one-time authorization code.
pub struct AuthorizationCodeGrant {
    context_cache: Arc<ContextCache>,
    token_service: Arc<TokenService>,
}

impl AuthorizationCodeGrant {
    #[must_use]
    pub fn new(context_cache: Arc<ContextCache>, token_service: Arc<TokenService>) -> Self {
        Self {
            context_cache,
            token_service,
        }
    }
}

#[async_trait]
impl GrantHandler for AuthorizationCodeGrant {
    fn grant_type(&self) -> &'static str {
        "authorization_code"
    }

    async fn handle(&self, ctx: &TokenContext) -> AuthResult<TokenResponse> {
        let code = ctx.request.code.as_deref().unwrap_or_default();

        // 1. Consume the code. Whatever happens next, it cannot be replayed.
        let authorize_ctx = self
            .context_cache
            .take_by_code(code)
            .ok_or(AuthError::InvalidCode)?;
        let original = &authorize_ctx.request;

        // 2. The code belongs to one client in one organization
        if original.client_id != ctx.client_id || !authorize_ctx.belongs_to(ctx.organization.id) {
            tracing::warn!(
                client_id = %ctx.client_id,
                organization = %ctx.organization.name,
                "authorization code presented by a different client or organization"
            );
            return Err(AuthError::InvalidCode);
        }
        let user = authorize_ctx
            .authenticated_user
            .as_ref()
            .ok_or(AuthError::InvalidCode)?;

        // 3. Optional redirect_uri must repeat the original
        if let Some(redirect_uri) = ctx.request.redirect_uri.as_deref() {
            if redirect_uri != original.redirect_uri {
                return Err(AuthError::InvalidRedirectUri);
            }
        }

        // 4. PKCE
        let method = CodeChallengeMethod::parse(&original.code_challenge_method)?;
        let verifier = ctx.request.code_verifier.as_deref().unwrap_or_default();
        verify_code_verifier(method, &original.code_challenge, verifier)?;

        // 5. Issue tokens
        let subject = user.id.to_string();
        let access_token = self.token_service.generate_access_token(&subject)?;
        let refresh_token = self
            .token_service
            .generate_refresh_token(&subject, &ctx.client_id, ctx.organization.id)
            .await?;

        tracing::info!(
            client_id = %ctx.client_id,
            organization = %ctx.organization.name,
            user_id = %user.id,
            "authorization code redeemed"
        );

        Ok(
            TokenResponse::new(access_token, self.token_service.access_token_expires_in())
                .with_refresh_token(refresh_token),
        )
    }
}
