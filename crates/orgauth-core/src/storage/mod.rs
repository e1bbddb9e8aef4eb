//! Storage traits for the authorization engine's collaborators.
//!
//! This module defines storage interfaces for:
//!
//! - Organizations (tenant lookup)
//! - Client applications
//! - Users and credential verification
//! - Refresh token records
//!
//! In-memory implementations live in [`memory`].

pub mod application;
pub mod memory;
pub mod organization;
pub mod refresh_token;
pub mod user;

pub use application::ApplicationStorage;
pub use memory::{
    InMemoryApplicationStorage, InMemoryOrganizationStorage, InMemoryRefreshTokenStorage,
    InMemoryUserStorage, NewApplication, NewUser,
};
pub use organization::OrganizationStorage;
pub use refresh_token::RefreshTokenStorage;
pub use user::UserStorage;
