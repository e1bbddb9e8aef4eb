//! Seeds the in-memory stores from `[bootstrap]` configuration.
//!
//! Client secrets and passwords are hashed on the way in; the plain text
//! never reaches the stores.

use std::sync::Arc;

use orgauth_core::AuthResult;
use orgauth_core::storage::{
    InMemoryApplicationStorage, InMemoryOrganizationStorage, InMemoryUserStorage, NewApplication,
    NewUser,
};
use tracing::info;

use crate::config::BootstrapConfig;

/// The in-memory stores the server runs on.
#[derive(Debug, Default)]
pub struct Stores {
    pub organizations: Arc<InMemoryOrganizationStorage>,
    pub applications: Arc<InMemoryApplicationStorage>,
    pub users: Arc<InMemoryUserStorage>,
}

/// What a bootstrap run created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BootstrapStats {
    pub organizations: usize,
    pub applications: usize,
    pub users: usize,
}

/// Creates every configured organization with its applications and users.
///
/// # Errors
///
/// Returns an error if a name is duplicated or hashing fails.
pub async fn seed(config: &BootstrapConfig, stores: &Stores) -> AuthResult<BootstrapStats> {
    let mut stats = BootstrapStats::default();

    for org_seed in &config.organizations {
        let org = stores.organizations.create(&org_seed.name).await?;
        stats.organizations += 1;

        for app in &org_seed.applications {
            stores
                .applications
                .register(NewApplication {
                    organization_id: org.id,
                    name: app.name.clone(),
                    client_id: app.client_id.clone(),
                    client_secret: app.client_secret.clone(),
                    redirect_uris: app.redirect_uris.clone(),
                })
                .await?;
            stats.applications += 1;
        }

        for user in &org_seed.users {
            stores
                .users
                .create(NewUser {
                    organization_id: org.id,
                    username: user.username.clone(),
                    email: user.email.clone(),
                    password: user.password.clone(),
                })
                .await?;
            stats.users += 1;
        }

        info!(
            organization = %org.name,
            applications = org_seed.applications.len(),
            users = org_seed.users.len(),
            "organization bootstrapped"
        );
    }

    Ok(stats)
}
