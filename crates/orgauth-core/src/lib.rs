//! # orgauth-core
//!
//! Multi-tenant OAuth 2.0 authorization engine.
//!
//! This crate provides:
//! - The authorization code flow with mandatory PKCE
//! - Refresh token and client credentials grants behind a pluggable registry
//! - Tenant (organization) resolution for `/o/{org_name}` routes
//! - JWT access and refresh tokens with durable refresh records
//! - Login sessions and server-rendered login pages
//!
//! ## Modules
//!
//! - [`config`] - Signing, lifetime and cookie configuration
//! - [`oauth`] - Authorization flow, PKCE, grants and orchestration
//! - [`token`] - JWT signing, key management and the token service
//! - [`cache`] - Clock-driven caches for flow state and tenant lookups
//! - [`session`] - Login sessions
//! - [`storage`] - Storage traits and in-memory implementations
//! - [`tenant`] - Tenant resolution middleware
//! - [`http`] - Axum handlers for the OAuth endpoints

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod password;
pub mod session;
pub mod storage;
pub mod tenant;
pub mod token;
pub mod types;

pub use cache::{CachingOrganizationStorage, ContextCache};
pub use clock::{Clock, ManualClock, SystemClock, system_clock};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, ErrorCategory};
pub use http::{OAuthState, oauth_router};
pub use oauth::{
    AuthorizeOutcome, ClientCredentials, GrantHandler, GrantRegistry, OAuth2Service, TokenContext,
    TokenRequest, TokenResponse,
};
pub use session::{SessionInfo, SessionStore};
pub use storage::{ApplicationStorage, OrganizationStorage, RefreshTokenStorage, UserStorage};
pub use tenant::{TenantState, resolve_tenant};
pub use token::{JwtService, KeyManager, TokenConfig, TokenService};
pub use types::{
    Application, AuthenticatedUser, Organization, OrganizationContext, RefreshTokenRecord, User,
};

/// Type alias for authorization results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use orgauth_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::clock::{Clock, system_clock};
    pub use crate::config::{AuthConfig, ConfigError};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::http::{OAuthState, oauth_router};
    pub use crate::oauth::{GrantHandler, GrantRegistry, OAuth2Service, TokenContext};
    pub use crate::storage::{
        ApplicationStorage, OrganizationStorage, RefreshTokenStorage, UserStorage,
    };
    pub use crate::tenant::{TenantState, resolve_tenant};
    pub use crate::types::{AuthenticatedUser, Organization, OrganizationContext};
}
