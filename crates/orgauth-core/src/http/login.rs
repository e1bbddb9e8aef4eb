//! Login endpoint handlers.
//!
//! `GET /o/{org}/login` shows the form, or skips it when the browser holds a
//! live session cookie for this organization. `POST /o/{org}/login` checks
//! the credentials, sets the cookie and resumes the authorize flow.

use axum::{
    Extension, Form,
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use serde::Deserialize;
use time::Duration;

use crate::error::AuthError;
use crate::http::templates::render_login_form;
use crate::http::{OAuthState, flow_url, found};
use crate::types::OrganizationContext;

/// Query parameters of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(default)]
    pub session_data_key: String,
}

/// Submitted login form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub session_data_key: String,
}

/// Renders the login form, or resumes the flow from a live session.
pub async fn login_page_handler(
    State(state): State<OAuthState>,
    Extension(org): Extension<OrganizationContext>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Response {
    if query.session_data_key.is_empty() {
        return AuthError::invalid_request("session_data_key is required").into_response();
    }

    let Some(session_id) = jar.get(&state.cookie.name).map(|c| c.value().to_string()) else {
        return Html(render_login_form(&org.name, &query.session_data_key)).into_response();
    };

    match state
        .service
        .resume_session(&org, &session_id, &query.session_data_key)
        .await
    {
        Ok(true) => found(&flow_url(&org, "authorize", &query.session_data_key)),
        Ok(false) => {
            // Stale or foreign session; drop the cookie and ask for credentials.
            let jar = jar.add(session_cookie(&state, String::new(), Duration::ZERO));
            (
                jar,
                Html(render_login_form(&org.name, &query.session_data_key)),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Verifies credentials, starts a login session and resumes the flow.
pub async fn login_handler(
    State(state): State<OAuthState>,
    Extension(org): Extension<OrganizationContext>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let session_data_key = if form.session_data_key.is_empty() {
        query.session_data_key
    } else {
        form.session_data_key
    };

    match state
        .service
        .login(&org, &form.username, &form.password, &session_data_key)
        .await
    {
        Ok(session_id) => {
            let lifetime = state.service.session_lifetime();
            let jar = jar.add(session_cookie(&state, session_id, lifetime));
            (jar, found(&flow_url(&org, "authorize", &session_data_key))).into_response()
        }
        Err(e) => e.into_response(),
    }
}

fn session_cookie(state: &OAuthState, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((state.cookie.name.clone(), value))
        .http_only(true)
        .secure(state.cookie.secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}
