//! `client_credentials` grant.

use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::oauth::grant::{GrantHandler, TokenContext};
use crate::oauth::token::TokenResponse;
use crate::token::TokenService;

/// Issues an access token to the client itself. No refresh token.
pub struct ClientCredentialsGrant {
    token_service: Arc<TokenService>,
}

impl ClientCredentialsGrant {
    #[must_use]
    pub fn new(token_service: Arc<TokenService>) -> Self {
        Self { token_service }
    }
}

#[async_trait]
impl GrantHandler for ClientCredentialsGrant {
    fn grant_type(&self) -> &'static str {
        "client_credentials"
    }

    async fn handle(&self, ctx: &TokenContext) -> AuthResult<TokenResponse> {
        let access_token = self.token_service.generate_access_token(&ctx.client_id)?;
        tracing::debug!(
            client_id = %ctx.client_id,
            organization = %ctx.organization.name,
            "client credentials token issued"
        );
        Ok(TokenResponse::new(
            access_token,
            self.token_service.access_token_expires_in(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::oauth::token::TokenRequest;
    use crate::storage::InMemoryRefreshTokenStorage;
    use crate::token::{AccessTokenClaims, JwtService, SigningKeyPair, TokenConfig};
    use crate::types::OrganizationContext;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_subject_is_client_and_no_refresh_token() {
        let storage = Arc::new(InMemoryRefreshTokenStorage::new());
        let jwt = JwtService::new(
            Arc::new(SigningKeyPair::hmac("test", b"secret").unwrap()),
            "http://localhost:8080",
        );
        let tokens = Arc::new(TokenService::new(
            jwt,
            storage.clone(),
            Arc::new(ManualClock::starting_now()),
            TokenConfig::new("http://localhost:8080"),
        ));
        let grant = ClientCredentialsGrant::new(tokens.clone());

        let response = grant
            .handle(&TokenContext {
                organization: OrganizationContext {
                    id: Uuid::new_v4(),
                    name: "acme".to_string(),
                },
                client_id: "service-a".to_string(),
                request: TokenRequest {
                    grant_type: "client_credentials".to_string(),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        assert!(response.refresh_token.is_none());
        let claims = tokens
            .jwt_service()
            .decode::<AccessTokenClaims>(&response.access_token)
            .unwrap()
            .claims;
        assert_eq!(claims.sub, "service-a");
        assert!(storage.is_empty().await);
    }
}
