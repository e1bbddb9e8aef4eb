//! A string-keyed map whose entries may carry an expiry instant.
//!
//! Expired entries are evicted lazily on read and in bulk by
//! [`ExpiringMap::purge_expired`]. No operation performs I/O.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use time::{Duration, OffsetDateTime};

use crate::clock::Clock;

struct Entry<V> {
    value: V,
    expires_at: Option<OffsetDateTime>,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Thread-safe map with optional per-entry TTL.
pub struct ExpiringMap<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> ExpiringMap<V> {
    /// Creates an empty map driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Inserts or replaces an entry. `None` means the entry never expires.
    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| self.clock.now() + ttl);
        self.entries
            .write()
            .insert(key.into(), Entry { value, expires_at });
    }

    /// Returns a clone of the live entry for `key`, evicting it if expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        None
    }

    /// Removes and returns the live entry for `key`.
    ///
    /// Of two concurrent callers at most one receives the value.
    pub fn take(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let entry = self.entries.write().remove(key)?;
        (!entry.is_expired(now)).then_some(entry.value)
    }

    /// Removes and returns the live entry for `key` if `pred` accepts it.
    ///
    /// The check and the removal happen under one write lock.
    pub fn take_if(&self, key: &str, pred: impl FnOnce(&V) -> bool) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let live = match entries.get(key) {
            None => return None,
            Some(entry) if entry.is_expired(now) => false,
            Some(entry) if pred(&entry.value) => true,
            Some(_) => return None,
        };
        let entry = entries.remove(key)?;
        live.then_some(entry.value)
    }

    /// Replaces the live entry for `key` with `f(&current)`, keeping its
    /// expiry. Absent entries are not recreated.
    ///
    /// Returns the stored value, or `None` when nothing was present or `f`
    /// declined.
    pub fn update(&self, key: &str, f: impl FnOnce(&V) -> Option<V>) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        if entries.get(key)?.is_expired(now) {
            entries.remove(key);
            return None;
        }
        let entry = entries.get_mut(key)?;
        let value = f(&entry.value)?;
        entry.value = value.clone();
        Some(value)
    }

    /// Removes the entry for `key`. Returns `true` if one was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn map() -> (Arc<ManualClock>, ExpiringMap<u32>) {
        let clock = Arc::new(ManualClock::starting_now());
        let map = ExpiringMap::new(clock.clone());
        (clock, map)
    }

    #[test]
    fn test_entries_without_ttl_never_expire() {
        let (clock, map) = map();
        map.insert("k", 1, None);
        clock.advance(Duration::days(365));
        assert_eq!(map.get("k"), Some(1));
    }

    #[test]
    fn test_expired_entries_are_evicted_on_read() {
        let (clock, map) = map();
        map.insert("k", 1, Some(Duration::minutes(5)));
        clock.advance(Duration::minutes(4));
        assert_eq!(map.get("k"), Some(1));

        clock.advance(Duration::minutes(1));
        assert_eq!(map.get("k"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_take_is_single_use() {
        let (_clock, map) = map();
        map.insert("k", 7, Some(Duration::minutes(5)));
        assert_eq!(map.take("k"), Some(7));
        assert_eq!(map.take("k"), None);
        assert_eq!(map.get("k"), None);
    }

    #[test]
    fn test_take_ignores_expired_entry() {
        let (clock, map) = map();
        map.insert("k", 7, Some(Duration::seconds(1)));
        clock.advance(Duration::seconds(2));
        assert_eq!(map.take("k"), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_take_if_leaves_rejected_entry() {
        let (_clock, map) = map();
        map.insert("k", 7, None);
        assert_eq!(map.take_if("k", |v| *v > 10), None);
        assert_eq!(map.get("k"), Some(7));
        assert_eq!(map.take_if("k", |v| *v == 7), Some(7));
        assert_eq!(map.get("k"), None);
    }

    #[test]
    fn test_update_does_not_recreate_removed_entry() {
        let (clock, map) = map();
        assert_eq!(map.update("k", |v| Some(v + 1)), None);
        assert!(map.is_empty());

        map.insert("k", 1, Some(Duration::minutes(5)));
        assert_eq!(map.update("k", |v| Some(v + 1)), Some(2));
        assert_eq!(map.update("k", |_| None), None);
        assert_eq!(map.get("k"), Some(2));

        // Expiry is kept from the original insert
        clock.advance(Duration::minutes(5));
        assert_eq!(map.update("k", |v| Some(v + 1)), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let (clock, map) = map();
        map.insert("short", 1, Some(Duration::minutes(1)));
        map.insert("long", 2, Some(Duration::hours(1)));
        map.insert("forever", 3, None);
        clock.advance(Duration::minutes(2));

        assert_eq!(map.purge_expired(), 1);
        assert_eq!(map.len(), 2);
        assert!(map.remove("long"));
        assert!(!map.remove("long"));
    }
}
