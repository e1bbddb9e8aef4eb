//! Refresh token record storage trait.
//!
//! # Consistency
//!
//! - `create` must be durable before the token is handed to the client
//! - A `delete` that completes before `find_by_jti` starts must be observed

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::types::RefreshTokenRecord;

/// Storage trait for refresh token records.
#[async_trait]
pub trait RefreshTokenStorage: Send + Sync {
    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored (e.g. duplicate
    /// `jti`, storage unavailable).
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()>;

    /// Finds a record by `jti`.
    ///
    /// # Returns
    ///
    /// `Some(record)` if present regardless of expiry, `None` if never
    /// issued or revoked.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_jti(&self, jti: &str) -> AuthResult<Option<RefreshTokenRecord>>;

    /// Deletes a record.
    ///
    /// # Returns
    ///
    /// `true` if a record was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete(&self, jti: &str) -> AuthResult<bool>;

    /// Deletes all records expired at `now`.
    ///
    /// # Returns
    ///
    /// The number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64>;
}
