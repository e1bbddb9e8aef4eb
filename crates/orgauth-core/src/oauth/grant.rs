//! Grant handler dispatch.
//!
//! The token endpoint authenticates the client, then looks up the handler
//! registered for the request's `grant_type`. Adding a grant type means
//! implementing [`GrantHandler`] and registering it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::AuthResult;
use crate::cache::ContextCache;
use crate::error::AuthError;
use crate::oauth::grants::{
    AuthorizationCodeGrant, ClientCredentialsGrant, RefreshTokenGrant,
};
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::token::TokenService;
use crate::types::OrganizationContext;

/// Everything a grant handler may rely on.
#[derive(Debug, Clone)]
pub struct TokenContext {
    /// Organization resolved from the request path.
    pub organization: OrganizationContext,

    /// Client id whose secret was already verified.
    pub client_id: String,

    /// The raw token request.
    pub request: TokenRequest,
}

/// A handler for one OAuth 2.0 grant type.
#[async_trait]
pub trait GrantHandler: Send + Sync {
    /// The `grant_type` value this handler serves.
    fn grant_type(&self) -> &'static str;

    /// Exchanges the grant for tokens.
    ///
    /// # Errors
    ///
    /// Returns a client error when the grant is invalid, or a server error
    /// when token issuance fails.
    async fn handle(&self, ctx: &TokenContext) -> AuthResult<TokenResponse>;
}

/// Grant type → handler map.
#[derive(Default, Clone)]
pub struct GrantRegistry {
    handlers: HashMap<&'static str, Arc<dyn GrantHandler>>,
}

impl GrantRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `authorization_code`, `refresh_token` and
    /// `client_credentials`.
    #[must_use]
    pub fn with_default_handlers(
        context_cache: Arc<ContextCache>,
        token_service: Arc<TokenService>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AuthorizationCodeGrant::new(
            context_cache,
            token_service.clone(),
        )));
        registry.register(Arc::new(RefreshTokenGrant::new(token_service.clone())));
        registry.register(Arc::new(ClientCredentialsGrant::new(token_service)));
        registry
    }

    /// Registers `handler` under its grant type, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn GrantHandler>) {
        self.handlers.insert(handler.grant_type(), handler);
    }

    /// Looks up the handler for `grant_type`.
    ///
    /// # Errors
    ///
    /// Returns `unsupported grant type` if nothing is registered.
    pub fn get(&self, grant_type: &str) -> AuthResult<Arc<dyn GrantHandler>> {
        self.handlers
            .get(grant_type)
            .cloned()
            .ok_or_else(|| AuthError::unsupported_grant_type(grant_type))
    }

    /// Registered grant types, sorted.
    #[must_use]
    pub fn grant_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.handlers.keys().copied().collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for GrantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantRegistry")
            .field("grant_types", &self.grant_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    struct StaticGrant;

    #[async_trait]
    impl GrantHandler for StaticGrant {
        fn grant_type(&self) -> &'static str {
            "urn:test:static"
        }

        async fn handle(&self, ctx: &TokenContext) -> AuthResult<TokenResponse> {
            Ok(TokenResponse::new(format!("for-{}", ctx.client_id), 60))
        }
    }

    fn context() -> TokenContext {
        TokenContext {
            organization: OrganizationContext {
                id: Uuid::new_v4(),
                name: "acme".to_string(),
            },
            client_id: "c1".to_string(),
            request: TokenRequest::default(),
        }
    }

    #[tokio::test]
    async fn test_registered_handler_is_dispatched() {
        let mut registry = GrantRegistry::new();
        registry.register(Arc::new(StaticGrant));

        let handler = registry.get("urn:test:static").unwrap();
        let response = handler.handle(&context()).await.unwrap();
        assert_eq!(response.access_token, "for-c1");
    }

    #[test]
    fn test_unknown_grant_type() {
        let registry = GrantRegistry::new();
        let err = registry.get("password").err().unwrap();
        assert!(matches!(err, AuthError::UnsupportedGrantType { .. }));
        assert_eq!(err.reason(), "unsupported grant type");
    }
}
