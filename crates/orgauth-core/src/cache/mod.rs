//! Ephemeral in-process caches.
//!
//! - [`ExpiringMap`] - Clock-driven map with optional per-entry TTL
//! - [`ContextCache`] - Authorize-flow state by session data key and by code
//! - [`CachingOrganizationStorage`] - Read-through cache for tenant lookups

pub mod context;
pub mod expiring;
pub mod organization;

pub use context::ContextCache;
pub use expiring::ExpiringMap;
pub use organization::CachingOrganizationStorage;
