//! Read-through cache in front of an [`OrganizationStorage`].
//!
//! The tenant resolver looks up the organization on every request; this
//! decorator keeps recent lookups for a short TTL, indexed by name and id.
//! Misses are not cached.

use std::sync::Arc;

use async_trait::async_trait;
use time::Duration;
use uuid::Uuid;

use crate::AuthResult;
use crate::cache::ExpiringMap;
use crate::clock::Clock;
use crate::storage::OrganizationStorage;
use crate::types::Organization;

/// Default lifetime of a cached organization.
pub const DEFAULT_ORGANIZATION_TTL: Duration = Duration::minutes(5);

/// Caching decorator for organization lookups.
pub struct CachingOrganizationStorage {
    inner: Arc<dyn OrganizationStorage>,
    by_name: ExpiringMap<Organization>,
    by_id: ExpiringMap<Organization>,
    ttl: Duration,
}

impl CachingOrganizationStorage {
    /// Wraps `inner` with a cache of the given TTL.
    #[must_use]
    pub fn new(inner: Arc<dyn OrganizationStorage>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            inner,
            by_name: ExpiringMap::new(clock.clone()),
            by_id: ExpiringMap::new(clock),
            ttl,
        }
    }

    fn remember(&self, org: &Organization) {
        self.by_name.insert(org.name.clone(), org.clone(), Some(self.ttl));
        self.by_id.insert(org.id.to_string(), org.clone(), Some(self.ttl));
    }

    /// Drops expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.by_name.purge_expired() + self.by_id.purge_expired()
    }
}

#[async_trait]
impl OrganizationStorage for CachingOrganizationStorage {
    async fn find_by_name(&self, name: &str) -> AuthResult<Option<Organization>> {
        if let Some(org) = self.by_name.get(name) {
            return Ok(Some(org));
        }
        let org = self.inner.find_by_name(name).await?;
        if let Some(org) = &org {
            self.remember(org);
        }
        Ok(org)
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Organization>> {
        if let Some(org) = self.by_id.get(&id.to_string()) {
            return Ok(Some(org));
        }
        let org = self.inner.find_by_id(id).await?;
        if let Some(org) = &org {
            self.remember(org);
        }
        Ok(org)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::clock::ManualClock;

    struct CountingStorage {
        org: Organization,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OrganizationStorage for CountingStorage {
        async fn find_by_name(&self, name: &str) -> AuthResult<Option<Organization>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((name == self.org.name).then(|| self.org.clone()))
        }

        async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Organization>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((id == self.org.id).then(|| self.org.clone()))
        }
    }

    #[tokio::test]
    async fn test_hits_are_served_from_cache_until_ttl() {
        let inner = Arc::new(CountingStorage {
            org: Organization::new("acme"),
            calls: AtomicUsize::new(0),
        });
        let clock = Arc::new(ManualClock::starting_now());
        let cache = CachingOrganizationStorage::new(
            inner.clone(),
            clock.clone(),
            DEFAULT_ORGANIZATION_TTL,
        );

        let org = cache.find_by_name("acme").await.unwrap().unwrap();
        cache.find_by_name("acme").await.unwrap();
        cache.find_by_id(org.id).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::minutes(6));
        cache.find_by_name("acme").await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_misses_are_not_cached() {
        let inner = Arc::new(CountingStorage {
            org: Organization::new("acme"),
            calls: AtomicUsize::new(0),
        });
        let cache = CachingOrganizationStorage::new(
            inner.clone(),
            Arc::new(ManualClock::starting_now()),
            DEFAULT_ORGANIZATION_TTL,
        );

        assert!(cache.find_by_name("globex").await.unwrap().is_none());
        assert!(cache.find_by_name("globex").await.unwrap().is_none());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
