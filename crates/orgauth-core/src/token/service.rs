//! Token service for issuing, validating and revoking tokens.
//!
//! - Access tokens are stateless JWTs
//! - Refresh tokens are JWTs backed by a durable [`RefreshTokenRecord`];
//!   the record is written before the token is returned and deleted on
//!   revocation
//!
//! # Usage
//!
//! ```ignore
//! use orgauth_core::token::{TokenConfig, TokenService};
//!
//! let config = TokenConfig::new("https://auth.example.com");
//! let service = TokenService::new(jwt_service, refresh_storage, clock, config);
//!
//! let access = service.generate_access_token(&user_id)?;
//! let refresh = service.generate_refresh_token(&user_id, "c1", org_id).await?;
//! ```

use std::sync::Arc;

use serde::Deserialize;
use time::Duration;
use uuid::Uuid;

use crate::AuthResult;
use crate::clock::Clock;
use crate::config::{AuthConfig, to_time_duration};
use crate::error::AuthError;
use crate::storage::RefreshTokenStorage;
use crate::token::jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims, check_time_window};
use crate::types::RefreshTokenRecord;

/// Configuration for the token service.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Issuer written to the `iss` claim.
    pub issuer: String,

    /// Access token lifetime.
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    pub refresh_token_lifetime: Duration,
}

impl TokenConfig {
    /// Creates a configuration with a 1 hour access token and a 30 day
    /// refresh token.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            access_token_lifetime: Duration::hours(1),
            refresh_token_lifetime: Duration::days(30),
        }
    }

    /// Builds the token configuration from the auth configuration.
    #[must_use]
    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self::new(config.issuer.clone())
            .with_access_token_lifetime(to_time_duration(config.oauth.access_token_lifetime))
            .with_refresh_token_lifetime(to_time_duration(config.oauth.refresh_token_lifetime))
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_token_lifetime = lifetime;
        self
    }
}

/// Only the `jti` is needed to revoke.
#[derive(Deserialize)]
struct JtiClaim {
    jti: String,
}

/// Token service.
pub struct TokenService {
    jwt_service: JwtService,
    refresh_token_storage: Arc<dyn RefreshTokenStorage>,
    clock: Arc<dyn Clock>,
    config: TokenConfig,
}

impl TokenService {
    /// Creates a new token service.
    #[must_use]
    pub fn new(
        jwt_service: JwtService,
        refresh_token_storage: Arc<dyn RefreshTokenStorage>,
        clock: Arc<dyn Clock>,
        config: TokenConfig,
    ) -> Self {
        Self {
            jwt_service,
            refresh_token_storage,
            clock,
            config,
        }
    }

    /// Issues an access token for `subject`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails.
    pub fn generate_access_token(&self, subject: &str) -> AuthResult<String> {
        let now = self.clock.now();
        let claims = AccessTokenClaims {
            iss: self.config.issuer.clone(),
            sub: subject.to_string(),
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            exp: (now + self.config.access_token_lifetime).unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        self.jwt_service
            .encode(&claims)
            .map_err(|e| AuthError::internal(format!("Failed to encode access token: {}", e)))
    }

    /// Issues a refresh token and persists its record.
    ///
    /// The record is stored before the token is signed, so a token the
    /// client holds always has a record until it is revoked or purged.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the record cannot be persisted, or an
    /// internal error if encoding fails.
    pub async fn generate_refresh_token(
        &self,
        subject: &str,
        client_id: &str,
        organization_id: Uuid,
    ) -> AuthResult<String> {
        // 1. Build claims
        let now = self.clock.now();
        let expires_at = now + self.config.refresh_token_lifetime;
        let claims = RefreshTokenClaims {
            iss: self.config.issuer.clone(),
            sub: subject.to_string(),
            client_id: client_id.to_string(),
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        // 2. Persist the record
        let record = RefreshTokenRecord {
            jti: claims.jti.clone(),
            subject: claims.sub.clone(),
            client_id: claims.client_id.clone(),
            organization_id,
            created_at: now,
            expires_at,
        };
        self.refresh_token_storage.create(&record).await?;

        // 3. Sign
        self.jwt_service
            .encode(&claims)
            .map_err(|e| AuthError::internal(format!("Failed to encode refresh token: {}", e)))
    }

    /// Validates a refresh token and returns its record.
    ///
    /// # Errors
    ///
    /// Returns `invalid_refresh_token` if the signature, algorithm, issuer
    /// or time window is wrong, or if the token has been revoked. Storage
    /// failures are returned as-is.
    pub async fn validate_refresh_token(&self, token: &str) -> AuthResult<RefreshTokenRecord> {
        // 1. Verify structure, algorithm, signature and issuer
        let data = self
            .jwt_service
            .decode::<RefreshTokenClaims>(token)
            .map_err(|e| AuthError::invalid_refresh_token(e.to_string()))?;
        let claims = data.claims;

        // 2. Check expiry against the injected clock
        check_time_window(claims.exp, claims.nbf, self.clock.now())
            .map_err(|e| AuthError::invalid_refresh_token(e.to_string()))?;

        // 3. Require a live record
        let record = self
            .refresh_token_storage
            .find_by_jti(&claims.jti)
            .await?
            .ok_or_else(|| AuthError::invalid_refresh_token("token has been revoked"))?;

        // 4. The record must describe this token
        if record.subject != claims.sub || record.client_id != claims.client_id {
            return Err(AuthError::invalid_refresh_token(
                "token does not match its record",
            ));
        }
        if record.is_expired_at(self.clock.now()) {
            return Err(AuthError::invalid_refresh_token("record has expired"));
        }

        Ok(record)
    }

    /// Revokes a refresh token by deleting its record.
    ///
    /// Best-effort: unparseable tokens and storage failures are logged and
    /// otherwise ignored.
    pub async fn revoke_token(&self, token: &str) {
        let jti = match self.jwt_service.decode::<JtiClaim>(token) {
            Ok(data) => data.claims.jti,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring revocation of unparseable token");
                return;
            }
        };

        match self.refresh_token_storage.delete(&jti).await {
            Ok(true) => tracing::info!(jti = %jti, "refresh token revoked"),
            Ok(false) => tracing::debug!(jti = %jti, "refresh token already revoked"),
            Err(e) => tracing::warn!(jti = %jti, error = %e, "failed to revoke refresh token"),
        }
    }

    /// Deletes refresh token records past their expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    pub async fn purge_expired_records(&self) -> AuthResult<u64> {
        self.refresh_token_storage
            .delete_expired(self.clock.now())
            .await
    }

    /// Access token lifetime in seconds, reported as `expires_in`.
    #[must_use]
    pub fn access_token_expires_in(&self) -> u64 {
        self.config.access_token_lifetime.whole_seconds().max(0) as u64
    }

    #[cfg(test)]
    pub(crate) fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::InMemoryRefreshTokenStorage;
    use crate::token::jwt::SigningKeyPair;

    struct Fixture {
        clock: Arc<ManualClock>,
        storage: Arc<InMemoryRefreshTokenStorage>,
        service: TokenService,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::starting_now());
        let storage = Arc::new(InMemoryRefreshTokenStorage::new());
        let jwt = JwtService::new(
            Arc::new(SigningKeyPair::hmac("test", b"secret").unwrap()),
            "https://auth.example.com",
        );
        let service = TokenService::new(
            jwt,
            storage.clone(),
            clock.clone(),
            TokenConfig::new("https://auth.example.com"),
        );
        Fixture {
            clock,
            storage,
            service,
        }
    }

    #[test]
    fn test_access_token_claims() {
        let f = fixture();
        let token = f.service.generate_access_token("user-1").unwrap();
        let claims = f
            .service
            .jwt_service()
            .decode::<AccessTokenClaims>(&token)
            .unwrap()
            .claims;

        let now = f.clock.now().unix_timestamp();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.iss, "https://auth.example.com");
        assert_eq!(claims.iat, now);
        assert_eq!(claims.nbf, now);
        assert_eq!(claims.exp, now + 3600);
        assert!(!claims.jti.is_empty());
        assert_eq!(f.service.access_token_expires_in(), 3600);
    }

    #[tokio::test]
    async fn test_refresh_token_is_persisted_before_return() {
        let f = fixture();
        let org_id = Uuid::new_v4();
        let token = f
            .service
            .generate_refresh_token("user-1", "c1", org_id)
            .await
            .unwrap();

        let claims = f
            .service
            .jwt_service()
            .decode::<RefreshTokenClaims>(&token)
            .unwrap()
            .claims;
        let record = f.storage.find_by_jti(&claims.jti).await.unwrap().unwrap();
        assert_eq!(record.subject, "user-1");
        assert_eq!(record.client_id, "c1");
        assert_eq!(record.organization_id, org_id);
        assert_eq!(record.expires_at, f.clock.now() + Duration::days(30));
        assert_eq!(claims.exp, record.expires_at.unix_timestamp());
    }

    #[tokio::test]
    async fn test_validate_then_revoke() {
        let f = fixture();
        let org_id = Uuid::new_v4();
        let token = f
            .service
            .generate_refresh_token("user-1", "c1", org_id)
            .await
            .unwrap();

        let record = f.service.validate_refresh_token(&token).await.unwrap();
        assert_eq!(record.subject, "user-1");
        assert_eq!(record.client_id, "c1");

        f.service.revoke_token(&token).await;
        let err = f.service.validate_refresh_token(&token).await.unwrap_err();
        assert_eq!(err.reason(), "invalid_refresh_token");
        assert!(f.storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_refresh_token_is_rejected() {
        let f = fixture();
        let token = f
            .service
            .generate_refresh_token("user-1", "c1", Uuid::new_v4())
            .await
            .unwrap();

        f.clock.advance(Duration::days(31));
        let err = f.service.validate_refresh_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken { .. }));

        assert_eq!(f.service.purge_expired_records().await.unwrap(), 1);
        assert!(f.storage.is_empty().await);
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let f = fixture();
        let access = f.service.generate_access_token("user-1").unwrap();
        let err = f.service.validate_refresh_token(&access).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken { .. }));
    }

    #[tokio::test]
    async fn test_token_from_other_key_is_rejected() {
        let f = fixture();
        let other = JwtService::new(
            Arc::new(SigningKeyPair::hmac("test", b"other-secret").unwrap()),
            "https://auth.example.com",
        );
        let now = f.clock.now();
        let forged = other
            .encode(&RefreshTokenClaims {
                iss: "https://auth.example.com".to_string(),
                sub: "user-1".to_string(),
                client_id: "c1".to_string(),
                iat: now.unix_timestamp(),
                nbf: now.unix_timestamp(),
                exp: (now + Duration::days(1)).unix_timestamp(),
                jti: "forged".to_string(),
            })
            .unwrap();

        let err = f.service.validate_refresh_token(&forged).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRefreshToken { .. }));
    }

    #[tokio::test]
    async fn test_revoke_garbage_is_silent() {
        let f = fixture();
        f.service.revoke_token("garbage").await;
        f.service.revoke_token("").await;
    }
}
