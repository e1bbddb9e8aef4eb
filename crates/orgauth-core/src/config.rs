//! Authorization server configuration.
//!
//! Every section is `#[serde(default)]` so a partial TOML file (or none at
//! all) yields a working server.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration of the authorization engine.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// issuer = "https://auth.example.com"
///
/// [auth.signing]
/// algorithm = "RS256"
/// private_key_path = "/etc/orgauth/signing.pem"
/// public_key_path = "/etc/orgauth/signing.pub.pem"
///
/// [auth.oauth]
/// authorization_code_lifetime = "5m"
/// access_token_lifetime = "1h"
/// refresh_token_lifetime = "30d"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer written to the `iss` claim of every token.
    pub issuer: String,

    /// Token signing configuration.
    pub signing: SigningConfig,

    /// OAuth 2.0 lifetimes.
    pub oauth: OAuthConfig,

    /// Session cookie settings.
    pub cookie: CookieConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "http://localhost:8080".to_string(),
            signing: SigningConfig::default(),
            oauth: OAuthConfig::default(),
            cookie: CookieConfig::default(),
        }
    }
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Name under which the active key is registered.
    pub key_name: String,

    /// Signing algorithm. Supported: "HS256", "RS256", "RS384".
    pub algorithm: String,

    /// Shared secret for HS256. A random secret is generated when unset.
    pub secret: Option<String>,

    /// PEM-encoded private key for RS256/RS384. A key pair is generated
    /// when unset.
    pub private_key_path: Option<String>,

    /// PEM-encoded public key matching `private_key_path`.
    pub public_key_path: Option<String>,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            key_name: "default".to_string(),
            algorithm: "HS256".to_string(),
            secret: None,
            private_key_path: None,
            public_key_path: None,
        }
    }
}

/// Lifetimes of the artifacts produced by the authorization flow.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OAuthConfig {
    /// How long an issued authorization code stays redeemable.
    #[serde(with = "humantime_serde")]
    pub authorization_code_lifetime: Duration,

    /// Access token lifetime, also reported as `expires_in`.
    #[serde(with = "humantime_serde")]
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Lifetime of the login session behind the session cookie.
    #[serde(with = "humantime_serde")]
    pub session_lifetime: Duration,
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            authorization_code_lifetime: Duration::from_secs(300), // 5 minutes
            access_token_lifetime: Duration::from_secs(3600),      // 1 hour
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 3600), // 30 days
            session_lifetime: Duration::from_secs(1800),           // 30 minutes
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// Set the `Secure` attribute. Enable behind TLS.
    pub secure: bool,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session_id".to_string(),
            secure: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The issuer is empty
    /// - The signing algorithm is not supported
    /// - A lifetime is zero
    ///
    /// Returns `ConfigError::Missing` if only one half of a PEM key pair is
    /// configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        if self.signing.key_name.is_empty() {
            return Err(ConfigError::InvalidValue(
                "signing.key_name cannot be empty".to_string(),
            ));
        }

        match self.signing.algorithm.as_str() {
            "HS256" => {
                if matches!(&self.signing.secret, Some(s) if s.is_empty()) {
                    return Err(ConfigError::InvalidValue(
                        "signing.secret cannot be empty".to_string(),
                    ));
                }
            }
            "RS256" | "RS384" => {
                match (
                    &self.signing.private_key_path,
                    &self.signing.public_key_path,
                ) {
                    (Some(_), None) => {
                        return Err(ConfigError::Missing("signing.public_key_path".to_string()));
                    }
                    (None, Some(_)) => {
                        return Err(ConfigError::Missing(
                            "signing.private_key_path".to_string(),
                        ));
                    }
                    _ => {}
                }
            }
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid signing algorithm: '{}'. Must be HS256, RS256, or RS384",
                    other
                )));
            }
        }

        let lifetimes = [
            (
                "authorization_code_lifetime",
                self.oauth.authorization_code_lifetime,
            ),
            ("access_token_lifetime", self.oauth.access_token_lifetime),
            ("refresh_token_lifetime", self.oauth.refresh_token_lifetime),
            ("session_lifetime", self.oauth.session_lifetime),
        ];
        for (name, lifetime) in lifetimes {
            if lifetime.is_zero() {
                return Err(ConfigError::InvalidValue(format!(
                    "oauth.{} must be > 0",
                    name
                )));
            }
        }

        if self.cookie.name.is_empty() {
            return Err(ConfigError::InvalidValue(
                "cookie.name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Converts a configured lifetime into a `time::Duration`, saturating on
/// overflow.
#[must_use]
pub fn to_time_duration(d: Duration) -> time::Duration {
    time::Duration::try_from(d).unwrap_or(time::Duration::MAX)
}
