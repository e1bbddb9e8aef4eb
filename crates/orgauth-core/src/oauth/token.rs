//! Token endpoint types.
//!
//! # Supported Grant Types
//!
//! - `authorization_code` - Exchange authorization code for tokens
//! - `refresh_token` - Mint a new access token from a refresh token
//! - `client_credentials` - Machine-to-machine authentication

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Token request parameters.
///
/// Required fields depend on `grant_type`:
///
/// - `authorization_code`: code, code_verifier, (optional) redirect_uri
/// - `refresh_token`: refresh_token
/// - `client_credentials`: nothing beyond client credentials
///
/// Clients authenticate with HTTP Basic or with `client_id` +
/// `client_secret` in the body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type.
    #[serde(default)]
    pub grant_type: String,

    /// Authorization code (for authorization_code grant).
    #[serde(default)]
    pub code: Option<String>,

    /// Redirect URI. When present it must match the authorization request.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// PKCE code verifier (for authorization_code grant).
    #[serde(default)]
    pub code_verifier: Option<String>,

    /// Client ID (client_secret_post).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Client secret (client_secret_post).
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Refresh token (for refresh_token grant).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Requested scope. Accepted and ignored.
    #[serde(default)]
    pub scope: Option<String>,
}

/// Successful token response.
///
/// # Example Response
///
/// ```json
/// {
///   "access_token": "eyJhbG...",
///   "refresh_token": "eyJhbG...",
///   "token_type": "Bearer",
///   "expires_in": 3600
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// The access token (JWT).
    pub access_token: String,

    /// The refresh token (JWT). Never present for client credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type, always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

impl TokenResponse {
    /// Creates a response carrying only an access token.
    #[must_use]
    pub fn new(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }

    /// Adds a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, token: String) -> Self {
        self.refresh_token = Some(token);
        self
    }
}

/// Token endpoint error body.
///
/// ```json
/// { "error": "invalid_code" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenErrorResponse {
    /// Machine-readable reason.
    pub error: String,
}

impl From<&AuthError> for TokenErrorResponse {
    fn from(err: &AuthError) -> Self {
        Self {
            error: err.reason().to_string(),
        }
    }
}
