//! Refresh token records.
//!
//! A record is written for every issued refresh token and deleted on
//! revocation. Its existence is what makes a refresh token "not revoked";
//! the JWT itself is never stored.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Durable record keyed by the refresh token's `jti`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
    /// JWT id of the refresh token.
    pub jti: String,

    /// Token subject (user id, or client id for client tokens).
    pub subject: String,

    /// Client the token was issued to.
    pub client_id: String,

    /// Organization the token was issued in.
    pub organization_id: Uuid,

    /// When the token was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the token stops being valid.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl RefreshTokenRecord {
    /// Returns `true` if the record has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_expiry_boundary() {
        let now = OffsetDateTime::now_utc();
        let record = RefreshTokenRecord {
            jti: "jti-1".to_string(),
            subject: "user-1".to_string(),
            client_id: "c1".to_string(),
            organization_id: Uuid::new_v4(),
            created_at: now,
            expires_at: now + Duration::days(30),
        };

        assert!(!record.is_expired_at(now));
        assert!(record.is_expired_at(now + Duration::days(30)));
    }
}
