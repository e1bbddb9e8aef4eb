//! Authorization flow orchestration.
//!
//! [`OAuth2Service`] owns the protocol decisions for every endpoint. The
//! HTTP layer only translates between requests and these calls.
//!
//! ```text
//!   authorize(initial) ──► AWAITING_LOGIN ──login──► AUTHENTICATED
//!                                                        │
//!                              authorize(session_data_key)
//!                                                        ▼
//!                             token(authorization_code) ◄── CODE_ISSUED
//! ```

use std::sync::Arc;

use time::Duration;
use url::Url;

use crate::AuthResult;
use crate::cache::ContextCache;
use crate::error::AuthError;
use crate::oauth::authorize::{
    AuthorizeContext, AuthorizeRequest, FlowStage, generate_code, generate_session_data_key,
};
use crate::oauth::grant::{GrantRegistry, TokenContext};
use crate::oauth::pkce::CodeChallengeMethod;
use crate::oauth::token::{TokenRequest, TokenResponse};
use crate::session::SessionStore;
use crate::storage::{ApplicationStorage, UserStorage};
use crate::token::TokenService;
use crate::types::{AuthenticatedUser, OrganizationContext};

/// What the authorization endpoint should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    /// Send the browser to the login page for this flow.
    RedirectToLogin {
        /// Flow handle to carry through login.
        session_data_key: String,
    },
    /// Send the browser back to the client with a code.
    IssueCode {
        /// Client redirect URI with `code` and `state` appended.
        redirect_url: Url,
    },
}

/// Client credentials presented at the token endpoint.
#[derive(Debug, Clone, Default)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Counts from one janitor pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeStats {
    pub contexts: usize,
    pub sessions: usize,
    pub refresh_records: u64,
}

/// The authorization engine.
pub struct OAuth2Service {
    applications: Arc<dyn ApplicationStorage>,
    users: Arc<dyn UserStorage>,
    context_cache: Arc<ContextCache>,
    sessions: Arc<SessionStore>,
    token_service: Arc<TokenService>,
    grants: GrantRegistry,
    session_lifetime: Duration,
}

impl OAuth2Service {
    /// Creates the service with the built-in grant handlers.
    #[must_use]
    pub fn new(
        applications: Arc<dyn ApplicationStorage>,
        users: Arc<dyn UserStorage>,
        context_cache: Arc<ContextCache>,
        sessions: Arc<SessionStore>,
        token_service: Arc<TokenService>,
        session_lifetime: Duration,
    ) -> Self {
        let grants = GrantRegistry::with_default_handlers(
            context_cache.clone(),
            token_service.clone(),
        );
        Self {
            applications,
            users,
            context_cache,
            sessions,
            token_service,
            grants,
            session_lifetime,
        }
    }

    /// Login session lifetime, also used as the cookie max-age.
    #[must_use]
    pub fn session_lifetime(&self) -> Duration {
        self.session_lifetime
    }

    // =========================================================================
    // Authorization endpoint
    // =========================================================================

    /// Handles one pass of the authorization endpoint.
    ///
    /// Without a `session_data_key` the request is validated and parked
    /// until login. With one, the parked flow is turned into a code.
    ///
    /// # Errors
    ///
    /// Returns a client error for invalid parameters or an unknown flow
    /// handle, or a server error if storage fails.
    pub async fn authorize(
        &self,
        org: &OrganizationContext,
        request: AuthorizeRequest,
    ) -> AuthResult<AuthorizeOutcome> {
        if request.is_initial_request() {
            self.start_authorization(org, request).await
        } else {
            self.complete_authorization(org, &request.session_data_key)
        }
    }

    async fn start_authorization(
        &self,
        org: &OrganizationContext,
        mut request: AuthorizeRequest,
    ) -> AuthResult<AuthorizeOutcome> {
        // 1. Required parameters
        if !request.is_valid_request() {
            return Err(AuthError::invalid_request("invalid request"));
        }
        if request.response_type != "code" {
            return Err(AuthError::unsupported_response_type(&request.response_type));
        }
        CodeChallengeMethod::parse(&request.code_challenge_method)?;

        // 2. Client and redirect URI
        if !self
            .applications
            .validate_client_id(org.id, &request.client_id)
            .await?
        {
            return Err(AuthError::InvalidClientId);
        }
        if !self
            .applications
            .validate_redirect_uri(org.id, &request.client_id, &request.redirect_uri)
            .await?
        {
            return Err(AuthError::InvalidRedirectUri);
        }

        // 3. Bind to the resolved tenant and park until login
        request.organization_id = Some(org.id);
        request.organization_name = org.name.clone();
        let session_data_key = generate_session_data_key();

        tracing::debug!(
            organization = %org.name,
            client_id = %request.client_id,
            "authorization request accepted"
        );
        self.context_cache
            .put_by_session_key(&session_data_key, AuthorizeContext::new(request));

        Ok(AuthorizeOutcome::RedirectToLogin { session_data_key })
    }

    fn complete_authorization(
        &self,
        org: &OrganizationContext,
        session_data_key: &str,
    ) -> AuthResult<AuthorizeOutcome> {
        // Taking the flow makes the handle single-use under concurrency
        let Some(ctx) = self.context_cache.take_by_session_key_if(session_data_key, |ctx| {
            ctx.belongs_to(org.id) && ctx.stage() == FlowStage::Authenticated
        }) else {
            return match self
                .context_cache
                .get_by_session_key(session_data_key)
                .filter(|ctx| ctx.belongs_to(org.id))
            {
                Some(_) => Ok(AuthorizeOutcome::RedirectToLogin {
                    session_data_key: session_data_key.to_string(),
                }),
                None => Err(AuthError::InvalidSessionDataKey),
            };
        };

        let mut redirect_url = Url::parse(&ctx.request.redirect_uri)
            .map_err(|_| AuthError::InvalidRedirectUri)?;

        let code = generate_code();
        {
            let mut query = redirect_url.query_pairs_mut();
            query.append_pair("code", &code);
            if !ctx.request.state.is_empty() {
                query.append_pair("state", &ctx.request.state);
            }
        }

        tracing::info!(
            organization = %org.name,
            client_id = %ctx.request.client_id,
            "authorization code issued"
        );
        self.context_cache.put_by_code(&code, ctx);

        Ok(AuthorizeOutcome::IssueCode { redirect_url })
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Verifies credentials and attaches the user to the parked flow.
    ///
    /// Returns the id of the new login session.
    ///
    /// # Errors
    ///
    /// - `invalid_request` when the flow handle is missing
    /// - `invalid credentials` for an unknown user or wrong password
    /// - `invalid_session_data_key` when the flow is unknown or belongs to
    ///   another organization
    pub async fn login(
        &self,
        org: &OrganizationContext,
        username: &str,
        password: &str,
        session_data_key: &str,
    ) -> AuthResult<String> {
        if session_data_key.is_empty() {
            return Err(AuthError::invalid_request("session_data_key is required"));
        }

        let user = self
            .users
            .authenticate(org.id, username, password)
            .await?
            .ok_or_else(|| {
                tracing::info!(organization = %org.name, username = %username, "login failed");
                AuthError::InvalidCredentials
            })?;

        self.attach_user(org, session_data_key, user)
            .ok_or(AuthError::InvalidSessionDataKey)
    }

    /// Reuses a live login session for a new flow.
    ///
    /// Returns `false` when the session is unknown, expired, belongs to
    /// another organization, or the flow handle is not parked here. The
    /// caller should then show the login form.
    ///
    /// # Errors
    ///
    /// Returns an error if user storage fails.
    pub async fn resume_session(
        &self,
        org: &OrganizationContext,
        session_id: &str,
        session_data_key: &str,
    ) -> AuthResult<bool> {
        let Some(session) = self
            .sessions
            .get(session_id)
            .filter(|s| s.organization_id == org.id)
        else {
            return Ok(false);
        };
        if self
            .context_cache
            .get_by_session_key(session_data_key)
            .filter(|ctx| ctx.belongs_to(org.id))
            .is_none()
        {
            return Ok(false);
        }
        let Some(user) = self.users.find_by_id(org.id, session.user_id).await? else {
            self.sessions.delete(session_id);
            return Ok(false);
        };

        // The flow may have been consumed while the user was loaded
        let user = AuthenticatedUser::from(&user);
        let resumed = self
            .context_cache
            .update_by_session_key(session_data_key, |ctx| {
                ctx.belongs_to(org.id).then(|| ctx.clone().with_user(user.clone()))
            })
            .is_some();
        if resumed {
            tracing::debug!(organization = %org.name, user_id = %user.id, "login session resumed");
        }
        Ok(resumed)
    }

    /// Attaches `user` to a parked flow and opens a login session.
    ///
    /// Returns `None` without creating a session when the flow is unknown,
    /// belongs to another organization or was consumed concurrently.
    fn attach_user(
        &self,
        org: &OrganizationContext,
        session_data_key: &str,
        user: AuthenticatedUser,
    ) -> Option<String> {
        let ctx = self
            .context_cache
            .update_by_session_key(session_data_key, |ctx| {
                ctx.belongs_to(org.id).then(|| ctx.clone().with_user(user.clone()))
            })?;

        let session_id = self.sessions.create(
            user.id,
            user.organization_id,
            &ctx.request.client_id,
            self.session_lifetime,
        );
        tracing::info!(organization = %org.name, user_id = %user.id, "user logged in");
        Some(session_id)
    }

    // =========================================================================
    // Token and revocation
    // =========================================================================

    /// Authenticates the client and dispatches to the grant handler.
    ///
    /// # Errors
    ///
    /// - `invalid client_id` / `invalid client_secret` before dispatch
    /// - `unsupported grant type` for unregistered grants
    /// - whatever the grant handler returns
    pub async fn token(
        &self,
        org: &OrganizationContext,
        credentials: ClientCredentials,
        request: TokenRequest,
    ) -> AuthResult<TokenResponse> {
        // 1. Client authentication
        if credentials.client_id.is_empty()
            || !self
                .applications
                .validate_client_id(org.id, &credentials.client_id)
                .await?
        {
            return Err(AuthError::InvalidClientId);
        }
        if !self
            .applications
            .validate_client_secret(org.id, &credentials.client_id, &credentials.client_secret)
            .await?
        {
            return Err(AuthError::InvalidClientSecret);
        }

        // 2. Dispatch
        let handler = self.grants.get(&request.grant_type)?;
        let ctx = TokenContext {
            organization: org.clone(),
            client_id: credentials.client_id,
            request,
        };
        handler.handle(&ctx).await
    }

    /// Revokes a refresh token. Never fails.
    pub async fn revoke(&self, token: &str) {
        self.token_service.revoke_token(token).await;
    }

    /// Drops expired flow contexts, sessions and refresh records.
    ///
    /// # Errors
    ///
    /// Returns an error if refresh token storage fails.
    pub async fn purge_expired(&self) -> AuthResult<PurgeStats> {
        Ok(PurgeStats {
            contexts: self.context_cache.purge_expired(),
            sessions: self.sessions.purge_expired(),
            refresh_records: self.token_service.purge_expired_records().await?,
        })
    }
}
