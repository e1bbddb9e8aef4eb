//! User storage trait.
//!
//! Defines lookup and credential verification for end users. Every
//! operation is scoped by organization.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password::verify_secret;
use crate::types::{AuthenticatedUser, User};

/// Storage trait for users.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Finds a user by login name within an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_username(
        &self,
        organization_id: Uuid,
        username: &str,
    ) -> AuthResult<Option<User>>;

    /// Finds a user by id within an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, organization_id: Uuid, user_id: Uuid) -> AuthResult<Option<User>>;

    /// Verifies a username and password.
    ///
    /// # Returns
    ///
    /// `Some(user)` when the credentials are valid, `None` for an unknown
    /// user or a wrong password.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails or the stored hash is
    /// malformed.
    async fn authenticate(
        &self,
        organization_id: Uuid,
        username: &str,
        password: &str,
    ) -> AuthResult<Option<AuthenticatedUser>> {
        let Some(user) = self.find_by_username(organization_id, username).await? else {
            return Ok(None);
        };
        let valid = verify_secret(password, &user.password_hash)
            .map_err(|e| AuthError::internal(format!("Failed to verify password: {}", e)))?;
        Ok(valid.then(|| AuthenticatedUser::from(&user)))
    }
}
