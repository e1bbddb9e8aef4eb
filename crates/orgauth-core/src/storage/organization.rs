//! Organization storage trait.

use async_trait::async_trait;
use uuid::Uuid;

use crate::AuthResult;
use crate::types::Organization;

/// Lookup interface for organizations.
#[async_trait]
pub trait OrganizationStorage: Send + Sync {
    /// Finds an organization by its unique name.
    ///
    /// # Returns
    ///
    /// `Some(org)` if found, `None` if no organization has that name.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_name(&self, name: &str) -> AuthResult<Option<Organization>>;

    /// Finds an organization by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Organization>>;
}
