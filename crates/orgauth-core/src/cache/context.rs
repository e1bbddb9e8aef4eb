//! Authorize context cache.
//!
//! Holds [`AuthorizeContext`] values in two slots:
//!
//! - by session data key, with no expiry; the orchestrator takes the entry
//!   out when it issues a code, so each key yields at most one code
//! - by authorization code, with a short TTL; redeeming the code removes it
//!
//! A miss in either slot is a protocol error for the caller, never a retry.

use std::sync::Arc;

use time::Duration;

use crate::cache::ExpiringMap;
use crate::clock::Clock;
use crate::oauth::authorize::AuthorizeContext;

/// Cache of in-flight authorization requests.
pub struct ContextCache {
    by_session_key: ExpiringMap<AuthorizeContext>,
    by_code: ExpiringMap<AuthorizeContext>,
    code_ttl: Duration,
}

impl ContextCache {
    /// Creates an empty cache. Codes expire after `code_ttl`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, code_ttl: Duration) -> Self {
        Self {
            by_session_key: ExpiringMap::new(clock.clone()),
            by_code: ExpiringMap::new(clock),
            code_ttl,
        }
    }

    /// Stores `ctx` under a session data key, replacing any previous value.
    pub fn put_by_session_key(&self, key: &str, ctx: AuthorizeContext) {
        self.by_session_key.insert(key, ctx, None);
    }

    /// Returns the context cached under a session data key.
    pub fn get_by_session_key(&self, key: &str) -> Option<AuthorizeContext> {
        self.by_session_key.get(key)
    }

    /// Atomically removes and returns the context under a session data key
    /// when `pred` accepts it.
    ///
    /// Concurrent callers with the same key see at most one `Some`.
    pub fn take_by_session_key_if(
        &self,
        key: &str,
        pred: impl FnOnce(&AuthorizeContext) -> bool,
    ) -> Option<AuthorizeContext> {
        self.by_session_key.take_if(key, pred)
    }

    /// Replaces the context under a session data key with `f(&current)`.
    ///
    /// Never recreates a key that has already been consumed.
    pub fn update_by_session_key(
        &self,
        key: &str,
        f: impl FnOnce(&AuthorizeContext) -> Option<AuthorizeContext>,
    ) -> Option<AuthorizeContext> {
        self.by_session_key.update(key, f)
    }

    /// Removes the context cached under a session data key.
    pub fn delete_by_session_key(&self, key: &str) {
        self.by_session_key.remove(key);
    }

    /// Stores `ctx` under an authorization code with the code TTL.
    pub fn put_by_code(&self, code: &str, ctx: AuthorizeContext) {
        self.by_code.insert(code, ctx, Some(self.code_ttl));
    }

    /// Returns the context cached under an authorization code.
    pub fn get_by_code(&self, code: &str) -> Option<AuthorizeContext> {
        self.by_code.get(code)
    }

    /// Removes the context cached under an authorization code.
    pub fn delete_by_code(&self, code: &str) {
        self.by_code.remove(code);
    }

    /// Atomically removes and returns the context for a code.
    ///
    /// Concurrent redemptions of the same code see at most one `Some`.
    pub fn take_by_code(&self, code: &str) -> Option<AuthorizeContext> {
        self.by_code.take(code)
    }

    /// Drops expired codes. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.by_session_key.purge_expired() + self.by_code.purge_expired()
    }
}
