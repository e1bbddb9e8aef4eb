//! OAuth 2.0 authorization code flow with PKCE.
//!
//! - [`authorize`] - Authorization request and flow context types
//! - [`pkce`] - Code challenge verification
//! - [`token`] - Token endpoint request and response types
//! - [`grant`] - Grant handler trait and registry
//! - [`grants`] - Built-in grant handlers
//! - [`service`] - Flow orchestration

pub mod authorize;
pub mod grant;
pub mod grants;
pub mod pkce;
pub mod service;
pub mod token;

pub use authorize::{AuthorizeContext, AuthorizeRequest, FlowStage};
pub use grant::{GrantHandler, GrantRegistry, TokenContext};
pub use pkce::{CodeChallengeMethod, PkceError};
pub use service::{AuthorizeOutcome, ClientCredentials, OAuth2Service, PurgeStats};
pub use token::{TokenErrorResponse, TokenRequest, TokenResponse};
