//! Registered OAuth 2.0 client applications.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A client application registered within one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    /// Internal identifier.
    pub id: Uuid,

    /// Owning organization.
    pub organization_id: Uuid,

    /// Human-readable name.
    pub name: String,

    /// Public client identifier.
    pub client_id: String,

    /// Argon2 PHC hash of the client secret.
    #[serde(skip_serializing)]
    pub client_secret_hash: String,

    /// Registered redirect URIs. Matching is exact.
    pub redirect_uris: Vec<String>,
}

impl Application {
    /// Returns `true` if `redirect_uri` is registered for this client.
    #[must_use]
    pub fn is_redirect_uri_registered(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|uri| uri == redirect_uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_uri_matching_is_exact() {
        let app = Application {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "demo".to_string(),
            client_id: "c1".to_string(),
            client_secret_hash: String::new(),
            redirect_uris: vec!["https://app/cb".to_string()],
        };

        assert!(app.is_redirect_uri_registered("https://app/cb"));
        assert!(!app.is_redirect_uri_registered("https://app/cb/"));
        assert!(!app.is_redirect_uri_registered("https://app/cb?x=1"));
    }
}
