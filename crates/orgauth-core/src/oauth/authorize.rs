//! Authorization endpoint types.
//!
//! The authorization code flow threads one [`AuthorizeContext`] across
//! several browser round trips:
//!
//! 1. The client sends the user to `/authorize`; the request is validated
//!    and cached under a fresh `session_data_key`
//! 2. The user logs in; the verified identity is attached to the context
//! 3. The second `/authorize` pass moves the context under a one-time code
//! 4. The client redeems the code at `/token`
//!
//! # Example
//!
//! ```text
//! GET /o/acme/authorize?
//!   response_type=code
//!   &client_id=c1
//!   &redirect_uri=https://app/cb
//!   &state=xyz
//!   &code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM
//!   &code_challenge_method=S256
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::AuthenticatedUser;

/// Authorization request parameters.
///
/// Received as query parameters. The organization fields are never read
/// from the query string; they are filled in from the resolved tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
    /// Must be "code".
    #[serde(default)]
    pub response_type: String,

    /// Client identifier.
    #[serde(default)]
    pub client_id: String,

    /// Redirect URI. Must be registered for the client.
    #[serde(default)]
    pub redirect_uri: String,

    /// Requested scopes (space-separated). Passed through.
    #[serde(default)]
    pub scope: String,

    /// Opaque client state, echoed back with the code.
    #[serde(default)]
    pub state: String,

    /// PKCE code challenge.
    #[serde(default)]
    pub code_challenge: String,

    /// PKCE code challenge method.
    #[serde(default)]
    pub code_challenge_method: String,

    /// Flow handle. Empty on the first request from the client.
    #[serde(default)]
    pub session_data_key: String,

    /// Resolved organization id.
    #[serde(skip_deserializing)]
    pub organization_id: Option<Uuid>,

    /// Resolved organization name.
    #[serde(skip_deserializing)]
    pub organization_name: String,
}

impl AuthorizeRequest {
    /// Returns `true` if this is the client's first contact (no flow handle).
    #[must_use]
    pub fn is_initial_request(&self) -> bool {
        self.session_data_key.is_empty()
    }

    /// Returns `true` if every required parameter is present.
    ///
    /// Requires non-empty `response_type`, `client_id`, `redirect_uri` and
    /// `code_challenge`, and a `code_challenge_method` other than `""` or
    /// `"none"`.
    #[must_use]
    pub fn is_valid_request(&self) -> bool {
        !self.response_type.is_empty()
            && !self.client_id.is_empty()
            && !self.redirect_uri.is_empty()
            && !self.code_challenge.is_empty()
            && !self.code_challenge_method.is_empty()
            && self.code_challenge_method != "none"
    }
}

/// Where a cached context is in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    /// Cached under a session data key, no user yet.
    AwaitingLogin,
    /// A verified user is attached.
    Authenticated,
}

/// Authorize-flow state carried between redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeContext {
    /// The original, validated request.
    pub request: AuthorizeRequest,

    /// Set once, at login.
    pub authenticated_user: Option<AuthenticatedUser>,
}

impl AuthorizeContext {
    /// Creates a context awaiting login.
    #[must_use]
    pub fn new(request: AuthorizeRequest) -> Self {
        Self {
            request,
            authenticated_user: None,
        }
    }

    /// Returns a copy of this context with `user` attached.
    #[must_use]
    pub fn with_user(mut self, user: AuthenticatedUser) -> Self {
        self.authenticated_user = Some(user);
        self
    }

    /// Current flow stage.
    #[must_use]
    pub fn stage(&self) -> FlowStage {
        if self.authenticated_user.is_some() {
            FlowStage::Authenticated
        } else {
            FlowStage::AwaitingLogin
        }
    }

    /// Returns `true` if the context was created in `organization_id`.
    #[must_use]
    pub fn belongs_to(&self, organization_id: Uuid) -> bool {
        self.request.organization_id == Some(organization_id)
    }
}

/// Generates a fresh session data key.
#[must_use]
pub fn generate_session_data_key() -> String {
    Uuid::new_v4().to_string()
}

/// Generates a fresh authorization code: 32 random bytes, base64url encoded.
#[must_use]
pub fn generate_code() -> String {
    let mut bytes = [0u8; 32];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
