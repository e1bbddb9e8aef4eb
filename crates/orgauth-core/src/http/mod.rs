//! HTTP handlers for the OAuth 2.0 endpoints.
//!
//! All routes are tenant-relative; mount [`oauth_router`] under
//! `/o/{org_name}` behind [`crate::tenant::resolve_tenant`].
//!
//! # Available Handlers
//!
//! - [`authorize`] - Authorization endpoint (both passes)
//! - [`login`] - Login form and credential submission
//! - [`token`] - Token endpoint
//! - [`revoke`] - Refresh token revocation

pub mod authorize;
pub mod login;
pub mod revoke;
pub mod templates;
pub mod token;

use std::sync::Arc;

use axum::{
    Router,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::config::CookieConfig;
use crate::oauth::OAuth2Service;
use crate::types::OrganizationContext;

pub use authorize::authorize_handler;
pub use login::{login_handler, login_page_handler};
pub use revoke::revoke_handler;
pub use token::token_handler;

/// Shared state for the OAuth handlers.
#[derive(Clone)]
pub struct OAuthState {
    /// Flow orchestrator.
    pub service: Arc<OAuth2Service>,
    /// Login session cookie settings.
    pub cookie: CookieConfig,
}

impl OAuthState {
    #[must_use]
    pub fn new(service: Arc<OAuth2Service>, cookie: CookieConfig) -> Self {
        Self { service, cookie }
    }
}

/// Tenant-relative OAuth routes.
pub fn oauth_router(state: OAuthState) -> Router {
    Router::new()
        .route("/authorize", get(authorize_handler))
        .route("/login", get(login_page_handler).post(login_handler))
        .route("/token", post(token_handler))
        .route("/revoke", post(revoke_handler))
        .with_state(state)
}

/// Everything except RFC 3986 unreserved characters is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Absolute path of a tenant endpoint carrying the flow handle.
pub(crate) fn flow_url(org: &OrganizationContext, endpoint: &str, session_data_key: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("session_data_key", session_data_key)
        .finish();
    format!(
        "/o/{}/{}?{}",
        utf8_percent_encode(&org.name, PATH_SEGMENT),
        endpoint,
        query
    )
}

/// 302 Found to `location`.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ContextCache;
    use crate::clock::ManualClock;
    use crate::oauth::pkce::s256_challenge;
    use crate::session::SessionStore;
    use crate::storage::{
        InMemoryApplicationStorage, InMemoryOrganizationStorage, InMemoryRefreshTokenStorage,
        InMemoryUserStorage, NewApplication, NewUser,
    };
    use crate::tenant::{TenantState, resolve_tenant};
    use crate::token::{JwtService, SigningKeyPair, TokenConfig, TokenService};
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum::middleware;
    use time::Duration;
    use tower::ServiceExt;

    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

    async fn app() -> Router {
        let clock = Arc::new(ManualClock::starting_now());
        let organizations = Arc::new(InMemoryOrganizationStorage::new());
        let org = organizations.create("acme").await.unwrap();

        let applications = Arc::new(InMemoryApplicationStorage::new());
        applications
            .register(NewApplication {
                organization_id: org.id,
                name: "Web".to_string(),
                client_id: "c1".to_string(),
                client_secret: "s1".to_string(),
                redirect_uris: vec!["https://app/cb".to_string()],
            })
            .await
            .unwrap();
        let users = Arc::new(InMemoryUserStorage::new());
        users
            .create(NewUser {
                organization_id: org.id,
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();

        let jwt = JwtService::new(
            Arc::new(SigningKeyPair::hmac("test", b"secret").unwrap()),
            "http://localhost:8080",
        );
        let tokens = Arc::new(TokenService::new(
            jwt,
            Arc::new(InMemoryRefreshTokenStorage::new()),
            clock.clone(),
            TokenConfig::new("http://localhost:8080"),
        ));
        let service = Arc::new(OAuth2Service::new(
            applications,
            users,
            Arc::new(ContextCache::new(clock.clone(), Duration::minutes(5))),
            Arc::new(SessionStore::new(clock)),
            tokens,
            Duration::minutes(30),
        ));

        let tenant_routes = oauth_router(OAuthState::new(service, CookieConfig::default()))
            .route_layer(middleware::from_fn_with_state(
                TenantState::new(organizations),
                resolve_tenant,
            ));
        Router::new().nest("/o/{org_name}", tenant_routes)
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn location(response: &Response) -> String {
        response.headers()[header::LOCATION]
            .to_str()
            .unwrap()
            .to_string()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn authorize_uri() -> String {
        format!(
            "/o/acme/authorize?response_type=code&client_id=c1&redirect_uri=https://app/cb\
             &state=xyz&code_challenge={}&code_challenge_method=S256",
            s256_challenge(VERIFIER)
        )
    }

    fn session_data_key(login_location: &str) -> String {
        login_location
            .split_once("session_data_key=")
            .map(|(_, k)| k.to_string())
            .unwrap()
    }

    /// Runs authorize + login and returns (session_data_key, Set-Cookie).
    async fn log_in(app: &Router) -> (String, String) {
        let response = app.clone().oneshot(get(&authorize_uri(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        let login = location(&response);
        assert!(login.starts_with("/o/acme/login?session_data_key="));
        let key = session_data_key(&login);

        let response = app
            .clone()
            .oneshot(post_form(
                "/o/acme/login",
                format!("username=alice&password=pw&session_data_key={}", key),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            format!("/o/acme/authorize?session_data_key={}", key)
        );
        let set_cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .to_string();
        (key, set_cookie)
    }

    #[tokio::test]
    async fn test_authorization_code_flow_over_http() {
        let app = app().await;
        let (key, set_cookie) = log_in(&app).await;
        assert!(set_cookie.starts_with("session_id="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Path=/"));
        assert!(set_cookie.contains("SameSite=Lax"));

        let response = app
            .clone()
            .oneshot(get(&format!("/o/acme/authorize?session_data_key={}", key), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        let start = html.find("window.location.replace(\"").unwrap() + 25;
        let end = start + html[start..].find('"').unwrap();
        let target = url::Url::parse(&html[start..end]).unwrap();
        let code = target
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned())
            .unwrap();

        let response = app
            .clone()
            .oneshot(post_form(
                "/o/acme/token",
                format!(
                    "grant_type=authorization_code&code={}&code_verifier={}&client_id=c1&client_secret=s1",
                    code, VERIFIER
                ),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(response.headers()[header::PRAGMA], "no-cache");
        let body: serde_json::Value =
            tokio_test::assert_ok!(serde_json::from_str(&body_string(response).await));
        assert_eq!(body["token_type"], "Bearer");
        assert_eq!(body["expires_in"], 3600);
        assert!(body["refresh_token"].is_string());
    }

    #[tokio::test]
    async fn test_token_errors_are_json() {
        let app = app().await;
        let response = app
            .oneshot(post_form(
                "/o/acme/token",
                "grant_type=authorization_code&code=nope&code_verifier=x&client_id=c1&client_secret=s1"
                    .to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"], "invalid_code");
    }

    #[tokio::test]
    async fn test_authorize_errors_are_plain_text() {
        let app = app().await;
        let response = app
            .oneshot(get("/o/acme/authorize?response_type=code&client_id=c1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "invalid request");
    }

    #[tokio::test]
    async fn test_login_page_requires_session_data_key() {
        let app = app().await;
        let response = app.oneshot(get("/o/acme/login", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "session_data_key is required");
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = app().await;
        let response = app.clone().oneshot(get(&authorize_uri(), None)).await.unwrap();
        let key = session_data_key(&location(&response));

        let response = app
            .oneshot(post_form(
                "/o/acme/login",
                format!("username=alice&password=bad&session_data_key={}", key),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_string(response).await, "invalid credentials");
    }

    #[tokio::test]
    async fn test_session_cookie_skips_login_form() {
        let app = app().await;
        let (_, set_cookie) = log_in(&app).await;
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        let response = app.clone().oneshot(get(&authorize_uri(), None)).await.unwrap();
        let login = location(&response);
        let key = session_data_key(&login);

        let response = app.clone().oneshot(get(&login, Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            location(&response),
            format!("/o/acme/authorize?session_data_key={}", key)
        );

        // An unknown session cookie is cleared and the form is shown
        let response = app
            .oneshot(get(&login, Some("session_id=bogus")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(body_string(response).await.contains("name=\"password\""));
    }

    #[tokio::test]
    async fn test_revoke_always_succeeds() {
        let app = app().await;
        let response = app
            .clone()
            .oneshot(post_form("/o/acme/revoke", "token=garbage".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/o/acme/revoke")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_flow_url_escapes_organization_name() {
        let org = OrganizationContext {
            id: uuid::Uuid::new_v4(),
            name: "caf\u{e9} & co/x".to_string(),
        };
        let url = flow_url(&org, "login", "k 1");
        assert_eq!(url, "/o/caf%C3%A9%20%26%20co%2Fx/login?session_data_key=k+1");

        // Non-ASCII names still produce a valid Location header
        let response = found(&url);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response), url);
    }
}
