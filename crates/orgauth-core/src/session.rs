//! Authenticated login sessions.
//!
//! A session is created after a successful login and referenced by the
//! `session_id` cookie. It lets a returning browser skip the login form
//! while it is still valid.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::cache::ExpiringMap;
use crate::clock::Clock;

/// A live login session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Opaque session id, sent as the cookie value.
    pub session_id: String,
    /// Authenticated user.
    pub user_id: Uuid,
    /// Organization the user logged into.
    pub organization_id: Uuid,
    /// Client that initiated the login.
    pub client_id: String,
    /// When the session stops being valid.
    pub expires_at: OffsetDateTime,
}

/// In-memory session store.
pub struct SessionStore {
    sessions: ExpiringMap<SessionInfo>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: ExpiringMap::new(clock.clone()),
            clock,
        }
    }

    /// Creates a session and returns its id.
    pub fn create(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        client_id: &str,
        ttl: Duration,
    ) -> String {
        let session_id = Uuid::new_v4().to_string();
        let info = SessionInfo {
            session_id: session_id.clone(),
            user_id,
            organization_id,
            client_id: client_id.to_string(),
            expires_at: self.clock.now() + ttl,
        };
        self.sessions.insert(session_id.clone(), info, Some(ttl));
        tracing::debug!(user_id = %user_id, organization_id = %organization_id, "session created");
        session_id
    }

    /// Returns the session if it exists and has not expired.
    pub fn get(&self, session_id: &str) -> Option<SessionInfo> {
        self.sessions.get(session_id)
    }

    /// Deletes a session.
    pub fn delete(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    /// Drops expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.sessions.purge_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn test_create_get_delete() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = SessionStore::new(clock.clone());
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let id = store.create(user_id, org_id, "c1", Duration::minutes(30));
        let info = store.get(&id).unwrap();
        assert_eq!(info.session_id, id);
        assert_eq!(info.user_id, user_id);
        assert_eq!(info.organization_id, org_id);
        assert_eq!(info.client_id, "c1");
        assert_eq!(info.expires_at, clock.now() + Duration::minutes(30));

        store.delete(&id);
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_expired_session_is_not_returned() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = SessionStore::new(clock.clone());
        let id = store.create(Uuid::new_v4(), Uuid::new_v4(), "c1", Duration::minutes(30));

        clock.advance(Duration::minutes(31));
        assert!(store.get(&id).is_none());
        assert_eq!(store.purge_expired(), 0);
    }

    #[test]
    fn test_session_ids_are_unique() {
        let store = SessionStore::new(Arc::new(ManualClock::starting_now()));
        let a = store.create(Uuid::new_v4(), Uuid::new_v4(), "c1", Duration::minutes(1));
        let b = store.create(Uuid::new_v4(), Uuid::new_v4(), "c1", Duration::minutes(1));
        assert_ne!(a, b);
    }
}
