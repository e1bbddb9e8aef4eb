//! Authorization endpoint handler.
//!
//! ```text
//! GET /o/{org}/authorize?response_type=code&client_id=...   (initial pass)
//!   → 302 /o/{org}/login?session_data_key=...
//!
//! GET /o/{org}/authorize?session_data_key=...                (after login)
//!   → 200 text/html, auto-redirect to redirect_uri?code=...&state=...
//! ```

use axum::{
    Extension,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};

use crate::http::templates::render_redirect_page;
use crate::http::{OAuthState, flow_url, found};
use crate::oauth::{AuthorizeOutcome, AuthorizeRequest};
use crate::types::OrganizationContext;

/// Handles both passes of the authorization endpoint.
///
/// Errors are plain text with the reason string as the body.
pub async fn authorize_handler(
    State(state): State<OAuthState>,
    Extension(org): Extension<OrganizationContext>,
    Query(request): Query<AuthorizeRequest>,
) -> Response {
    match state.service.authorize(&org, request).await {
        Ok(AuthorizeOutcome::RedirectToLogin { session_data_key }) => {
            found(&flow_url(&org, "login", &session_data_key))
        }
        Ok(AuthorizeOutcome::IssueCode { redirect_url }) => {
            Html(render_redirect_page(redirect_url.as_str())).into_response()
        }
        Err(e) => e.into_response(),
    }
}
