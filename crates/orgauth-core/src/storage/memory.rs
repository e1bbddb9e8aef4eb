//! In-memory storage backends.
//!
//! Used by the server binary (seeded from bootstrap configuration) and by
//! tests. Each store guards a `HashMap` with a `tokio::sync::RwLock`.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::AuthResult;
use crate::error::AuthError;
use crate::password::hash_secret;
use crate::storage::{ApplicationStorage, OrganizationStorage, RefreshTokenStorage, UserStorage};
use crate::types::{Application, Organization, RefreshTokenRecord, User};

// ============================================================================
// Organizations
// ============================================================================

/// In-memory organization store.
#[derive(Debug, Default)]
pub struct InMemoryOrganizationStorage {
    organizations: RwLock<HashMap<Uuid, Organization>>,
}

impl InMemoryOrganizationStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an organization.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the name is empty or already taken.
    pub async fn create(&self, name: &str) -> AuthResult<Organization> {
        if name.is_empty() {
            return Err(AuthError::storage("organization name cannot be empty"));
        }

        let mut organizations = self.organizations.write().await;
        if organizations.values().any(|org| org.name == name) {
            return Err(AuthError::storage(format!(
                "organization '{}' already exists",
                name
            )));
        }

        let org = Organization::new(name);
        organizations.insert(org.id, org.clone());
        Ok(org)
    }
}

#[async_trait]
impl OrganizationStorage for InMemoryOrganizationStorage {
    async fn find_by_name(&self, name: &str) -> AuthResult<Option<Organization>> {
        let organizations = self.organizations.read().await;
        Ok(organizations.values().find(|org| org.name == name).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> AuthResult<Option<Organization>> {
        Ok(self.organizations.read().await.get(&id).cloned())
    }
}

// ============================================================================
// Applications
// ============================================================================

/// Registration input for [`InMemoryApplicationStorage::register`].
#[derive(Debug, Clone)]
pub struct NewApplication {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// Public client identifier.
    pub client_id: String,
    /// Plaintext client secret. Only its hash is stored.
    pub client_secret: String,
    /// Registered redirect URIs.
    pub redirect_uris: Vec<String>,
}

/// In-memory client application store.
#[derive(Debug, Default)]
pub struct InMemoryApplicationStorage {
    applications: RwLock<HashMap<(Uuid, String), Application>>,
}

impl InMemoryApplicationStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client application, hashing its secret.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the client id is already registered in the
    /// organization, or an internal error if hashing fails.
    pub async fn register(&self, new: NewApplication) -> AuthResult<Application> {
        let key = (new.organization_id, new.client_id.clone());
        if self.applications.read().await.contains_key(&key) {
            return Err(AuthError::storage(format!(
                "client '{}' already registered",
                new.client_id
            )));
        }

        let client_secret_hash = hash_secret(&new.client_secret)
            .map_err(|e| AuthError::internal(format!("Failed to hash client secret: {}", e)))?;

        let app = Application {
            id: Uuid::new_v4(),
            organization_id: new.organization_id,
            name: new.name,
            client_id: new.client_id,
            client_secret_hash,
            redirect_uris: new.redirect_uris,
        };
        self.applications.write().await.insert(key, app.clone());
        Ok(app)
    }
}

#[async_trait]
impl ApplicationStorage for InMemoryApplicationStorage {
    async fn find_by_client_id(
        &self,
        organization_id: Uuid,
        client_id: &str,
    ) -> AuthResult<Option<Application>> {
        let applications = self.applications.read().await;
        Ok(applications
            .get(&(organization_id, client_id.to_string()))
            .cloned())
    }
}

// ============================================================================
// Users
// ============================================================================

/// Registration input for [`InMemoryUserStorage::create`].
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Owning organization.
    pub organization_id: Uuid,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password. Only its hash is stored.
    pub password: String,
}

/// In-memory user store.
#[derive(Debug, Default)]
pub struct InMemoryUserStorage {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a user, hashing the password.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the username is taken in the organization,
    /// or an internal error if hashing fails.
    pub async fn create(&self, new: NewUser) -> AuthResult<User> {
        let taken = self.users.read().await.values().any(|user| {
            user.organization_id == new.organization_id && user.username == new.username
        });
        if taken {
            return Err(AuthError::storage(format!(
                "user '{}' already exists",
                new.username
            )));
        }

        let password_hash = hash_secret(&new.password)
            .map_err(|e| AuthError::internal(format!("Failed to hash password: {}", e)))?;

        let user = User {
            id: Uuid::new_v4(),
            organization_id: new.organization_id,
            username: new.username,
            email: new.email,
            password_hash,
        };
        self.users.write().await.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl UserStorage for InMemoryUserStorage {
    async fn find_by_username(
        &self,
        organization_id: Uuid,
        username: &str,
    ) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|user| user.organization_id == organization_id && user.username == username)
            .cloned())
    }

    async fn find_by_id(&self, organization_id: Uuid, user_id: Uuid) -> AuthResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .filter(|user| user.organization_id == organization_id)
            .cloned())
    }
}

// ============================================================================
// Refresh token records
// ============================================================================

/// In-memory refresh token record store.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStorage {
    records: RwLock<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Returns `true` if no records are stored.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStorage for InMemoryRefreshTokenStorage {
    async fn create(&self, record: &RefreshTokenRecord) -> AuthResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.jti) {
            return Err(AuthError::storage(format!(
                "refresh token record '{}' already exists",
                record.jti
            )));
        }
        records.insert(record.jti.clone(), record.clone());
        Ok(())
    }

    async fn find_by_jti(&self, jti: &str) -> AuthResult<Option<RefreshTokenRecord>> {
        Ok(self.records.read().await.get(jti).cloned())
    }

    async fn delete(&self, jti: &str) -> AuthResult<bool> {
        Ok(self.records.write().await.remove(jti).is_some())
    }

    async fn delete_expired(&self, now: OffsetDateTime) -> AuthResult<u64> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired_at(now));
        Ok((before - records.len()) as u64)
    }
}
