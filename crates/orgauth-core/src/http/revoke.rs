//! Token revocation endpoint handler.
//!
//! ```text
//! POST /o/{org}/revoke
//! Content-Type: application/x-www-form-urlencoded
//!
//! token=<refresh_token>
//! ```
//!
//! Always answers 200, whether or not the token was known.

use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::http::OAuthState;

/// Form parameters for the revocation endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct RevocationForm {
    /// The refresh token to revoke.
    #[serde(default)]
    pub token: Option<String>,
}

/// Revokes a refresh token.
pub async fn revoke_handler(
    State(state): State<OAuthState>,
    form: Result<Form<RevocationForm>, FormRejection>,
) -> impl IntoResponse {
    let token = match form {
        Ok(Form(form)) => form.token.unwrap_or_default(),
        Err(e) => {
            tracing::debug!(error = %e, "unreadable revocation request");
            return StatusCode::OK;
        }
    };

    if !token.is_empty() {
        state.service.revoke(&token).await;
    }
    StatusCode::OK
}
