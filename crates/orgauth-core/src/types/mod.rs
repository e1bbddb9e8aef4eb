//! Domain types shared across the authorization engine.
//!
//! - [`Organization`] - Tenant that partitions clients, users and tokens
//! - [`Application`] - Registered OAuth 2.0 client
//! - [`User`] / [`AuthenticatedUser`] - End users and verified identities
//! - [`RefreshTokenRecord`] - Durable record backing an issued refresh token

pub mod application;
pub mod organization;
pub mod refresh_token;
pub mod user;

pub use application::Application;
pub use organization::{Organization, OrganizationContext};
pub use refresh_token::RefreshTokenRecord;
pub use user::{AuthenticatedUser, User};
