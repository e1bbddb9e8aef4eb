//! Token endpoint handler.
//!
//! ```text
//! POST /o/{org}/token
//! Content-Type: application/x-www-form-urlencoded
//! Authorization: Basic <base64(client_id:client_secret)>
//!
//! grant_type=authorization_code
//! &code=SplxlOBeZQQYbYS6WxSbIA
//! &code_verifier=dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk
//! ```
//!
//! Successful and failed responses are JSON and never cached.

use axum::{
    Extension, Form, Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::AuthError;
use crate::http::OAuthState;
use crate::oauth::{ClientCredentials, TokenErrorResponse, TokenRequest, TokenResponse};
use crate::types::OrganizationContext;

/// OAuth 2.0 token endpoint handler.
///
/// Clients authenticate with HTTP Basic or with `client_id` and
/// `client_secret` in the body. Basic wins when both are present.
pub async fn token_handler(
    State(state): State<OAuthState>,
    Extension(org): Extension<OrganizationContext>,
    headers: HeaderMap,
    Form(request): Form<TokenRequest>,
) -> Response {
    tracing::debug!(
        organization = %org.name,
        grant_type = %request.grant_type,
        "processing token request"
    );

    let credentials = extract_client_auth(&headers, &request);
    match state.service.token(&org, credentials, request).await {
        Ok(response) => token_success_response(response),
        Err(e) => token_error_response(e),
    }
}

/// Reads client credentials from the Authorization header or the body.
fn extract_client_auth(headers: &HeaderMap, request: &TokenRequest) -> ClientCredentials {
    let basic = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| STANDARD.decode(encoded.trim()).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .and_then(|creds| {
            creds
                .split_once(':')
                .map(|(id, secret)| (id.to_string(), secret.to_string()))
        });

    if let Some((client_id, client_secret)) = basic {
        return ClientCredentials {
            client_id,
            client_secret,
        };
    }

    ClientCredentials {
        client_id: request.client_id.clone().unwrap_or_default(),
        client_secret: request.client_secret.clone().unwrap_or_default(),
    }
}

fn token_success_response(response: TokenResponse) -> Response {
    (
        StatusCode::OK,
        [("Cache-Control", "no-store"), ("Pragma", "no-cache")],
        Json(response),
    )
        .into_response()
}

fn token_error_response(error: AuthError) -> Response {
    if error.is_server_error() {
        tracing::error!(error = %error, category = %error.category(), "token request failed");
    } else {
        tracing::debug!(error = %error, category = %error.category(), "token request rejected");
    }

    (
        error.status_code(),
        [("Cache-Control", "no-store"), ("Pragma", "no-cache")],
        Json(TokenErrorResponse::from(&error)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_basic_auth_wins_over_body() {
        let mut headers = HeaderMap::new();
        let encoded = STANDARD.encode("c1:s1");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap(),
        );
        let request = TokenRequest {
            client_id: Some("body".to_string()),
            client_secret: Some("body-secret".to_string()),
            ..Default::default()
        };

        let credentials = extract_client_auth(&headers, &request);
        assert_eq!(credentials.client_id, "c1");
        assert_eq!(credentials.client_secret, "s1");
    }

    #[test]
    fn test_secret_may_contain_colon() {
        let mut headers = HeaderMap::new();
        let encoded = STANDARD.encode("c1:s:1");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", encoded)).unwrap(),
        );

        let credentials = extract_client_auth(&headers, &TokenRequest::default());
        assert_eq!(credentials.client_secret, "s:1");
    }

    #[test]
    fn test_body_credentials_and_malformed_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic !!!"));
        let request = TokenRequest {
            client_id: Some("c1".to_string()),
            client_secret: Some("s1".to_string()),
            ..Default::default()
        };

        let credentials = extract_client_auth(&headers, &request);
        assert_eq!(credentials.client_id, "c1");
        assert_eq!(credentials.client_secret, "s1");
    }
}
