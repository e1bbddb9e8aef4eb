use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{Router, middleware, routing::get};
use orgauth_core::cache::organization::DEFAULT_ORGANIZATION_TTL;
use orgauth_core::config::to_time_duration;
use orgauth_core::oauth::PurgeStats;
use orgauth_core::storage::InMemoryRefreshTokenStorage;
use orgauth_core::{
    CachingOrganizationStorage, Clock, ContextCache, JwtService, KeyManager, OAuth2Service,
    OAuthState, SessionStore, TenantState, TokenConfig, TokenService, oauth_router,
    resolve_tenant, system_clock,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::bootstrap::{self, Stores};
use crate::{config::AppConfig, handlers, middleware as app_middleware};

/// How often expired flow state, sessions and refresh records are purged.
pub const JANITOR_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Services shared by the router and the janitor.
#[derive(Clone)]
pub struct AppState {
    pub oauth: Arc<OAuth2Service>,
    pub organizations: Arc<CachingOrganizationStorage>,
}

impl AppState {
    /// Wires the engine from configuration and seeds the stores.
    pub async fn from_config(cfg: &AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        // 1. Seed tenants, clients and users
        let stores = Stores::default();
        let stats = bootstrap::seed(&cfg.bootstrap, &stores)
            .await
            .context("bootstrap failed")?;
        tracing::info!(
            organizations = stats.organizations,
            applications = stats.applications,
            users = stats.users,
            "bootstrap complete"
        );

        // 2. Signing key
        let keys = KeyManager::from_config(&cfg.auth.signing).context("signing key")?;
        let key = keys
            .get(&cfg.auth.signing.key_name)
            .context("signing key not registered")?;
        let jwt = JwtService::new(key, cfg.auth.issuer.clone());

        // 3. Token service and flow state
        let token_service = Arc::new(TokenService::new(
            jwt,
            Arc::new(InMemoryRefreshTokenStorage::new()),
            clock.clone(),
            TokenConfig::from_auth_config(&cfg.auth),
        ));
        let context_cache = Arc::new(ContextCache::new(
            clock.clone(),
            to_time_duration(cfg.auth.oauth.authorization_code_lifetime),
        ));
        let sessions = Arc::new(SessionStore::new(clock.clone()));

        let oauth = Arc::new(OAuth2Service::new(
            stores.applications.clone(),
            stores.users.clone(),
            context_cache,
            sessions,
            token_service,
            to_time_duration(cfg.auth.oauth.session_lifetime),
        ));
        let organizations = Arc::new(CachingOrganizationStorage::new(
            stores.organizations.clone(),
            clock,
            DEFAULT_ORGANIZATION_TTL,
        ));

        Ok(Self {
            oauth,
            organizations,
        })
    }

    /// One janitor pass.
    pub async fn purge_expired(&self) -> orgauth_core::AuthResult<PurgeStats> {
        let organizations = self.organizations.purge_expired();
        let stats = self.oauth.purge_expired().await?;
        tracing::debug!(
            contexts = stats.contexts,
            sessions = stats.sessions,
            refresh_records = stats.refresh_records,
            organizations,
            "expired entries purged"
        );
        Ok(stats)
    }
}

pub fn build_app(cfg: &AppConfig, state: &AppState) -> Router {
    let body_limit = cfg.server.body_limit_bytes;

    let tenant_routes = oauth_router(OAuthState::new(
        state.oauth.clone(),
        cfg.auth.cookie.clone(),
    ))
    .route_layer(middleware::from_fn_with_state(
        TenantState::new(state.organizations.clone()),
        resolve_tenant,
    ));

    Router::new()
        .route("/healthz", get(handlers::healthz))
        .nest("/o/{org_name}", tenant_routes)
        // Layers run outermost-last: request id wraps trace so the span sees it
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    // Path only; query strings carry codes and flow handles
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri().path(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
}

pub struct OrgAuthServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<OrgAuthServer> {
        let state = AppState::from_config(&self.config, system_clock()).await?;
        let app = build_app(&self.config, &state);

        Ok(OrgAuthServer {
            addr: self.addr,
            app,
            state,
        })
    }
}

impl OrgAuthServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serves on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!("listening on {}", listener.local_addr()?);
        let janitor = spawn_janitor(self.state.clone(), JANITOR_INTERVAL);

        let result = axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await;

        janitor.abort();
        result?;
        Ok(())
    }
}

fn spawn_janitor(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = state.purge_expired().await {
                tracing::warn!(error = %e, "janitor pass failed");
            }
        }
    })
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApplicationSeed, OrganizationSeed, UserSeed};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use orgauth_core::oauth::AuthorizeRequest;
    use orgauth_core::oauth::pkce::s256_challenge;
    use orgauth_core::{AuthorizeOutcome, ManualClock, OrganizationContext, OrganizationStorage};
    use tower::ServiceExt;

    fn config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.bootstrap.organizations.push(OrganizationSeed {
            name: "acme".into(),
            applications: vec![ApplicationSeed {
                name: "Backend".into(),
                client_id: "svc".into(),
                client_secret: "secret".into(),
                redirect_uris: vec!["https://app/cb".into()],
            }],
            users: vec![UserSeed {
                username: "alice".into(),
                email: String::new(),
                password: "pw".into(),
            }],
        });
        cfg
    }

    #[tokio::test]
    async fn test_router_serves_health_and_tenants() {
        let cfg = config();
        let state = AppState::from_config(&cfg, system_clock()).await.unwrap();
        let app = build_app(&cfg, &state);

        let response = app
            .clone()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));

        let response = app
            .oneshot(
                Request::get("/o/nobody/login?session_data_key=x")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_janitor_pass_drops_expired_sessions() {
        let cfg = config();
        let clock = Arc::new(ManualClock::starting_now());
        let state = AppState::from_config(&cfg, clock.clone()).await.unwrap();

        let org: OrganizationContext = state
            .organizations
            .find_by_name("acme")
            .await
            .unwrap()
            .unwrap()
            .into();
        let outcome = state
            .oauth
            .authorize(
                &org,
                AuthorizeRequest {
                    response_type: "code".into(),
                    client_id: "svc".into(),
                    redirect_uri: "https://app/cb".into(),
                    code_challenge: s256_challenge("verifier"),
                    code_challenge_method: "S256".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let AuthorizeOutcome::RedirectToLogin { session_data_key } = outcome else {
            panic!("expected login redirect");
        };
        state
            .oauth
            .login(&org, "alice", "pw", &session_data_key)
            .await
            .unwrap();

        // Nothing has expired yet
        assert_eq!(state.purge_expired().await.unwrap().sessions, 0);

        let lifetime = to_time_duration(cfg.auth.oauth.session_lifetime);
        clock.advance(lifetime + time::Duration::SECOND);
        assert_eq!(state.purge_expired().await.unwrap().sessions, 1);
    }
}
