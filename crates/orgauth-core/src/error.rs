//! Authorization server error types.
//!
//! Every failure in the protocol engine is an [`AuthError`]. Each variant maps
//! to exactly one [`ErrorCategory`], one HTTP status and one short
//! machine-readable reason string that is safe to return to clients.
//! Collaborator failures (storage, internal) carry a detailed
//! message for logging but always surface to clients as `server_error`.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while processing authorize, login, token and revoke
/// requests.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The authorize or login request is malformed or incomplete.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Client-safe description of what is missing or malformed.
        message: String,
    },

    /// The authorization server only supports `response_type=code`.
    #[error("Unsupported response type: {response_type}")]
    UnsupportedResponseType {
        /// The rejected response type.
        response_type: String,
    },

    /// The client id is not registered in the resolved organization.
    #[error("Invalid client_id")]
    InvalidClientId,

    /// The client secret does not match the registered secret.
    #[error("Invalid client_secret")]
    InvalidClientSecret,

    /// The redirect URI is not registered for the client, or does not match
    /// the one used at authorize time.
    #[error("Invalid redirect_uri")]
    InvalidRedirectUri,

    /// No grant handler is registered for the requested grant type.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The unsupported grant type.
        grant_type: String,
    },

    /// The PKCE code challenge method is not `plain` or `S256`.
    #[error("Invalid code challenge method: {method}")]
    InvalidCodeChallengeMethod {
        /// The rejected method.
        method: String,
    },

    /// No cached authorize context exists for the session data key.
    #[error("Invalid session_data_key")]
    InvalidSessionDataKey,

    /// The authorization code is unknown, expired or already redeemed.
    #[error("Invalid authorization code")]
    InvalidCode,

    /// The PKCE code verifier does not match the stored challenge.
    #[error("Invalid code verifier")]
    InvalidCodeVerifier,

    /// The refresh token failed validation.
    #[error("Invalid refresh token: {message}")]
    InvalidRefreshToken {
        /// Internal description of the failed check. Not sent to clients.
        message: String,
    },

    /// The username or password is wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No organization exists for the tenant path segment.
    #[error("Organization not found: {name}")]
    OrganizationNotFound {
        /// The organization name from the request path.
        name: String,
    },

    /// An error occurred while storing or retrieving data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedResponseType` error.
    #[must_use]
    pub fn unsupported_response_type(response_type: impl Into<String>) -> Self {
        Self::UnsupportedResponseType {
            response_type: response_type.into(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `InvalidCodeChallengeMethod` error.
    #[must_use]
    pub fn invalid_code_challenge_method(method: impl Into<String>) -> Self {
        Self::InvalidCodeChallengeMethod {
            method: method.into(),
        }
    }

    /// Creates a new `InvalidRefreshToken` error.
    #[must_use]
    pub fn invalid_refresh_token(message: impl Into<String>) -> Self {
        Self::InvalidRefreshToken {
            message: message.into(),
        }
    }

    /// Creates a new `OrganizationNotFound` error.
    #[must_use]
    pub fn organization_not_found(name: impl Into<String>) -> Self {
        Self::OrganizationNotFound { name: name.into() }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !self.is_server_error()
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Internal { .. })
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidRequest { .. }
            | Self::UnsupportedResponseType { .. }
            | Self::InvalidClientId
            | Self::InvalidClientSecret
            | Self::InvalidRedirectUri
            | Self::UnsupportedGrantType { .. }
            | Self::InvalidCodeChallengeMethod { .. } => ErrorCategory::ClientRequest,
            Self::InvalidSessionDataKey | Self::InvalidCode | Self::InvalidCodeVerifier => {
                ErrorCategory::ProtocolState
            }
            Self::InvalidRefreshToken { .. } => ErrorCategory::Token,
            Self::InvalidCredentials => ErrorCategory::Authentication,
            Self::OrganizationNotFound { .. } => ErrorCategory::Tenant,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Returns the short reason string sent to clients.
    ///
    /// Server errors never expose their message.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidRequest { message } => message,
            Self::UnsupportedResponseType { .. } => "unsupported_response_type",
            Self::InvalidClientId => "invalid client_id",
            Self::InvalidClientSecret => "invalid client_secret",
            Self::InvalidRedirectUri => "invalid redirect_uri",
            Self::UnsupportedGrantType { .. } => "unsupported grant type",
            Self::InvalidCodeChallengeMethod { .. } => "invalid_code_challenge_method",
            Self::InvalidSessionDataKey => "invalid_session_data_key",
            Self::InvalidCode => "invalid_code",
            Self::InvalidCodeVerifier => "invalid_code_verifier",
            Self::InvalidRefreshToken { .. } => "invalid_refresh_token",
            Self::InvalidCredentials => "invalid credentials",
            Self::OrganizationNotFound { .. } => "not found",
            Self::Storage { .. } | Self::Internal { .. } => "server_error",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.category() {
            ErrorCategory::Authentication => StatusCode::UNAUTHORIZED,
            ErrorCategory::Tenant => StatusCode::NOT_FOUND,
            ErrorCategory::Infrastructure | ErrorCategory::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Plain-text error response used by the browser-facing endpoints.
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "request failed");
        } else {
            tracing::debug!(error = %self, category = %self.category(), "request rejected");
        }
        (self.status_code(), self.reason().to_string()).into_response()
    }
}

/// Categories of authorization server errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed requests, unknown clients and unsupported grant types.
    ClientRequest,
    /// Missing or stale flow state (session data key, code, PKCE).
    ProtocolState,
    /// Refresh token validation failures.
    Token,
    /// End-user credential failures.
    Authentication,
    /// Unknown organization.
    Tenant,
    /// Storage errors.
    Infrastructure,
    /// Internal server errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientRequest => write!(f, "client_request"),
            Self::ProtocolState => write!(f, "protocol_state"),
            Self::Token => write!(f, "token"),
            Self::Authentication => write!(f, "authentication"),
            Self::Tenant => write!(f, "tenant"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::unsupported_grant_type("password");
        assert_eq!(err.to_string(), "Unsupported grant type: password");

        let err = AuthError::invalid_refresh_token("jti not found");
        assert_eq!(err.to_string(), "Invalid refresh token: jti not found");
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(AuthError::InvalidClientId.reason(), "invalid client_id");
        assert_eq!(AuthError::InvalidClientSecret.reason(), "invalid client_secret");
        assert_eq!(AuthError::InvalidCode.reason(), "invalid_code");
        assert_eq!(AuthError::InvalidCodeVerifier.reason(), "invalid_code_verifier");
        assert_eq!(
            AuthError::InvalidSessionDataKey.reason(),
            "invalid_session_data_key"
        );
        assert_eq!(
            AuthError::unsupported_grant_type("x").reason(),
            "unsupported grant type"
        );
        assert_eq!(
            AuthError::invalid_request("session_data_key is required").reason(),
            "session_data_key is required"
        );
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = AuthError::storage("connection refused on 10.0.0.5:5432");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
        assert_eq!(err.reason(), "server_error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::organization_not_found("acme").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::invalid_refresh_token("expired").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::invalid_code_challenge_method("S512").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            AuthError::InvalidCode.category(),
            ErrorCategory::ProtocolState
        );
        assert_eq!(AuthError::InvalidClientId.category(), ErrorCategory::ClientRequest);
        assert_eq!(ErrorCategory::ProtocolState.to_string(), "protocol_state");
    }
}
