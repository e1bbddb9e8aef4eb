//! Tenant resolution.
//!
//! Every OAuth route lives under `/o/{org_name}`. [`resolve_tenant`] looks
//! the organization up once per request and stores an
//! [`OrganizationContext`] in the request extensions, so handlers never
//! parse the path themselves.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, middleware};
//! use orgauth_core::tenant::{TenantState, resolve_tenant};
//!
//! let tenant_routes = oauth_router(oauth_state)
//!     .route_layer(middleware::from_fn_with_state(tenant_state, resolve_tenant));
//! let app = Router::new().nest("/o/{org_name}", tenant_routes);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::storage::OrganizationStorage;
use crate::types::OrganizationContext;

/// Path parameter holding the organization name.
pub const ORG_PATH_PARAM: &str = "org_name";

/// State for [`resolve_tenant`].
#[derive(Clone)]
pub struct TenantState {
    organizations: Arc<dyn OrganizationStorage>,
}

impl TenantState {
    #[must_use]
    pub fn new(organizations: Arc<dyn OrganizationStorage>) -> Self {
        Self { organizations }
    }
}

/// Resolves `{org_name}` to an organization.
///
/// Unknown organizations get 404 `not found`, storage failures get 500.
pub async fn resolve_tenant(
    State(state): State<TenantState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(name) = params.get(ORG_PATH_PARAM).filter(|n| !n.is_empty()) else {
        return AuthError::organization_not_found("").into_response();
    };

    match state.organizations.find_by_name(name).await {
        Ok(Some(org)) => {
            tracing::trace!(organization = %org.name, organization_id = %org.id, "tenant resolved");
            req.extensions_mut()
                .insert(OrganizationContext::from(org));
            next.run(req).await
        }
        Ok(None) => AuthError::organization_not_found(name.as_str()).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryOrganizationStorage;
    use axum::{Extension, Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    async fn app() -> Router {
        let organizations = Arc::new(InMemoryOrganizationStorage::new());
        organizations.create("acme").await.unwrap();

        let tenant_routes = Router::new()
            .route(
                "/whoami",
                get(|Extension(org): Extension<OrganizationContext>| async move { org.name }),
            )
            .route_layer(middleware::from_fn_with_state(
                TenantState::new(organizations),
                resolve_tenant,
            ));
        Router::new().nest("/o/{org_name}", tenant_routes)
    }

    async fn get_path(app: Router, path: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_known_organization_is_injected() {
        let (status, body) = get_path(app().await, "/o/acme/whoami").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "acme");
    }

    #[tokio::test]
    async fn test_unknown_organization_is_not_found() {
        let (status, body) = get_path(app().await, "/o/globex/whoami").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "not found");
    }
}
