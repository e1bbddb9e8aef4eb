//! Named signing keys.
//!
//! The key manager keeps exactly one active key per name. Keys come from
//! configuration (shared secret or PEM files) or are generated at startup.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::SigningConfig;
use crate::token::jwt::{JwtError, SigningAlgorithm, SigningKeyPair};

/// Registry of active signing keys by name.
#[derive(Debug, Default)]
pub struct KeyManager {
    keys: RwLock<HashMap<String, Arc<SigningKeyPair>>>,
}

impl KeyManager {
    /// Creates an empty key manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a key manager holding the key described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is unsupported, a PEM file cannot
    /// be read or parsed, or key generation fails.
    pub fn from_config(config: &SigningConfig) -> Result<Self, JwtError> {
        let manager = Self::new();
        let key = load_key(config)?;
        tracing::info!(
            key_name = %config.key_name,
            kid = %key.kid,
            algorithm = %key.algorithm,
            "signing key ready"
        );
        manager.insert(config.key_name.clone(), key);
        Ok(manager)
    }

    /// Makes `key` the active key for `name`, replacing any previous one.
    pub fn insert(&self, name: impl Into<String>, key: SigningKeyPair) {
        self.keys.write().insert(name.into(), Arc::new(key));
    }

    /// Returns the active key for `name`.
    pub fn get(&self, name: &str) -> Option<Arc<SigningKeyPair>> {
        self.keys.read().get(name).cloned()
    }
}

fn load_key(config: &SigningConfig) -> Result<SigningKeyPair, JwtError> {
    let algorithm = SigningAlgorithm::parse(&config.algorithm)?;

    if !algorithm.is_rsa() {
        return match &config.secret {
            Some(secret) => SigningKeyPair::hmac(&config.key_name, secret.as_bytes()),
            None => {
                tracing::warn!(
                    key_name = %config.key_name,
                    "no signing secret configured; generated an ephemeral HS256 secret"
                );
                SigningKeyPair::generate_hmac(uuid::Uuid::new_v4().to_string())
            }
        };
    }

    match (&config.private_key_path, &config.public_key_path) {
        (Some(private_path), Some(public_path)) => {
            let private_pem = std::fs::read_to_string(private_path).map_err(|e| {
                JwtError::invalid_key(format!("Failed to read {}: {}", private_path, e))
            })?;
            let public_pem = std::fs::read_to_string(public_path).map_err(|e| {
                JwtError::invalid_key(format!("Failed to read {}: {}", public_path, e))
            })?;
            SigningKeyPair::from_pem(&config.key_name, algorithm, &private_pem, &public_pem)
        }
        (None, None) => {
            tracing::warn!(
                key_name = %config.key_name,
                algorithm = %algorithm,
                "no key files configured; generated an ephemeral RSA key pair"
            );
            SigningKeyPair::generate_rsa(uuid::Uuid::new_v4().to_string(), algorithm)
        }
        _ => Err(JwtError::invalid_key(
            "both private_key_path and public_key_path must be set",
        )),
    }
}
