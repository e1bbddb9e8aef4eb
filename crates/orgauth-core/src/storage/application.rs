//! Client application storage trait.
//!
//! All lookups are scoped by organization: a client id registered in one
//! organization is unknown in every other.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password::verify_secret;
use crate::types::Application;

/// Storage and validation interface for client applications.
#[async_trait]
pub trait ApplicationStorage: Send + Sync {
    /// Finds a client by `client_id` within an organization.
    ///
    /// # Arguments
    ///
    /// * `organization_id` - The resolved organization
    /// * `client_id` - The public client identifier
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_client_id(
        &self,
        organization_id: Uuid,
        client_id: &str,
    ) -> AuthResult<Option<Application>>;

    /// Returns `true` if the client exists in the organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn validate_client_id(&self, organization_id: Uuid, client_id: &str) -> AuthResult<bool> {
        Ok(self
            .find_by_client_id(organization_id, client_id)
            .await?
            .is_some())
    }

    /// Returns `true` if `redirect_uri` is registered for the client.
    ///
    /// Returns `false` for unknown clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn validate_redirect_uri(
        &self,
        organization_id: Uuid,
        client_id: &str,
        redirect_uri: &str,
    ) -> AuthResult<bool> {
        Ok(self
            .find_by_client_id(organization_id, client_id)
            .await?
            .is_some_and(|app| app.is_redirect_uri_registered(redirect_uri)))
    }

    /// Returns `true` if `client_secret` matches the stored hash.
    ///
    /// Returns `false` for unknown clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails or the stored hash is
    /// malformed.
    async fn validate_client_secret(
        &self,
        organization_id: Uuid,
        client_id: &str,
        client_secret: &str,
    ) -> AuthResult<bool> {
        let Some(app) = self.find_by_client_id(organization_id, client_id).await? else {
            return Ok(false);
        };
        verify_secret(client_secret, &app.client_secret_hash)
            .map_err(|e| AuthError::internal(format!("Failed to verify client secret: {}", e)))
    }
}
