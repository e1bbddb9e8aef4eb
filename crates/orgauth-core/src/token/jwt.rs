//! JWT encoding and validation.
//!
//! ## Supported Algorithms
//!
//! - **HS256**: HMAC with SHA-256 (shared secret)
//! - **RS256**: RSA with SHA-256
//! - **RS384**: RSA with SHA-384
//!
//! Tokens are only accepted when their header algorithm equals the active
//! key's algorithm. `exp` and `nbf` are checked by the caller against an
//! injected [`Clock`](crate::clock::Clock) via [`check_time_window`].
//!
//! ## Example
//!
//! ```ignore
//! use orgauth_core::token::jwt::{JwtService, SigningKeyPair};
//!
//! let key = SigningKeyPair::generate_hmac("default")?;
//! let jwt = JwtService::new(Arc::new(key), "https://auth.example.com");
//!
//! let token = jwt.encode(&claims)?;
//! let data = jwt.decode::<AccessTokenClaims>(&token)?;
//! check_time_window(data.claims.exp, data.claims.nbf, now)?;
//! ```

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, decode_header,
    encode,
};
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode a token.
    #[error("Failed to decode token: {message}")]
    DecodingError {
        /// Description of the decoding error.
        message: String,
    },

    /// The token header names a different algorithm than the active key.
    #[error("Algorithm mismatch: expected {expected}, got {found}")]
    AlgorithmMismatch {
        /// The active key's algorithm.
        expected: String,
        /// The algorithm in the token header.
        found: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token is not valid yet.
    #[error("Token not yet valid")]
    NotYetValid,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid or missing.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// Failed to generate a cryptographic key.
    #[error("Key generation error: {message}")]
    KeyGenerationError {
        /// Description of the key generation error.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `DecodingError`.
    #[must_use]
    pub fn decoding_error(message: impl Into<String>) -> Self {
        Self::DecodingError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `KeyGenerationError`.
    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::ImmatureSignature => Self::NotYetValid,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Json(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::decoding_error(err.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SigningAlgorithm {
    /// HMAC with SHA-256.
    HS256,
    /// RSA with SHA-256.
    RS256,
    /// RSA with SHA-384.
    RS384,
}

impl SigningAlgorithm {
    /// Parses an algorithm name.
    ///
    /// # Errors
    ///
    /// Returns `JwtError::InvalidKey` for unsupported names.
    pub fn parse(name: &str) -> Result<Self, JwtError> {
        match name {
            "HS256" => Ok(Self::HS256),
            "RS256" => Ok(Self::RS256),
            "RS384" => Ok(Self::RS384),
            other => Err(JwtError::invalid_key(format!(
                "Unsupported signing algorithm: {}",
                other
            ))),
        }
    }

    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::HS256 => Algorithm::HS256,
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
        }
    }

    /// Returns `true` if this is an RSA-based algorithm.
    #[must_use]
    pub fn is_rsa(&self) -> bool {
        matches!(self, Self::RS256 | Self::RS384)
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Token Claims
// ============================================================================

/// Access token claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Issuer.
    pub iss: String,

    /// Subject (user id, or client id for client credentials).
    pub sub: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Not before (Unix timestamp).
    pub nbf: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// JWT ID.
    pub jti: String,
}

/// Refresh token claims.
///
/// Same registered claims as [`AccessTokenClaims`] plus the client the token
/// was issued to. The `jti` keys the durable refresh token record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshTokenClaims {
    /// Issuer.
    pub iss: String,

    /// Subject.
    pub sub: String,

    /// OAuth client ID.
    pub client_id: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Not before (Unix timestamp).
    pub nbf: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,

    /// JWT ID.
    pub jti: String,
}

/// Checks `nbf <= now < exp`.
///
/// # Errors
///
/// Returns `JwtError::Expired` or `JwtError::NotYetValid`.
pub fn check_time_window(exp: i64, nbf: i64, now: OffsetDateTime) -> Result<(), JwtError> {
    let now = now.unix_timestamp();
    if now >= exp {
        return Err(JwtError::Expired);
    }
    if now < nbf {
        return Err(JwtError::NotYetValid);
    }
    Ok(())
}

// ============================================================================
// Signing Key Pair
// ============================================================================

/// A signing key for JWT operations.
pub struct SigningKeyPair {
    /// Key ID, written to the `kid` header.
    pub kid: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Encoding key (private key or shared secret) for signing.
    encoding_key: EncodingKey,

    /// Decoding key (public key or shared secret) for verification.
    decoding_key: DecodingKey,

    /// When the key was created or loaded.
    pub created_at: OffsetDateTime,
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl SigningKeyPair {
    /// Creates an HS256 key from a shared secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is empty.
    pub fn hmac(kid: impl Into<String>, secret: &[u8]) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::invalid_key("HMAC secret cannot be empty"));
        }

        Ok(Self {
            kid: kid.into(),
            algorithm: SigningAlgorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            created_at: OffsetDateTime::now_utc(),
        })
    }

    /// Generates an HS256 key with a random 256-bit secret.
    ///
    /// # Errors
    ///
    /// Never fails in practice; shares the signature of the other
    /// constructors.
    pub fn generate_hmac(kid: impl Into<String>) -> Result<Self, JwtError> {
        let mut secret = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut secret);
        Self::hmac(kid, &secret)
    }

    /// Generates a new RSA key pair.
    ///
    /// # Arguments
    /// * `kid` - Key ID
    /// * `algorithm` - The signing algorithm (must be RS256 or RS384)
    ///
    /// # Errors
    /// Returns an error if key generation fails or algorithm is not RSA-based.
    pub fn generate_rsa(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
    ) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::invalid_key(format!(
                "Algorithm {} is not RSA-based",
                algorithm
            )));
        }

        let bits = 2048;
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;
        let public_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Self::from_pem(kid, algorithm, private_pem.as_str(), &public_pem)
    }

    /// Loads an RSA key pair from PEM strings.
    ///
    /// # Arguments
    /// * `kid` - Key ID
    /// * `algorithm` - Signing algorithm (RS256 or RS384)
    /// * `private_pem` - PEM-encoded private key
    /// * `public_pem` - PEM-encoded public key
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid or the algorithm is not
    /// RSA-based.
    pub fn from_pem(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        if !algorithm.is_rsa() {
            return Err(JwtError::invalid_key(format!(
                "Algorithm {} cannot be loaded from PEM",
                algorithm
            )));
        }

        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Ok(Self {
            kid: kid.into(),
            algorithm,
            encoding_key,
            decoding_key,
            created_at: OffsetDateTime::now_utc(),
        })
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Service for encoding and decoding JWT tokens with one signing key.
///
/// This service is thread-safe (`Send + Sync`) and can be shared across
/// async tasks.
#[derive(Debug, Clone)]
pub struct JwtService {
    signing_key: Arc<SigningKeyPair>,
    issuer: String,
}

impl JwtService {
    /// Creates a new JWT service.
    ///
    /// # Arguments
    /// * `signing_key` - The key to sign and verify with
    /// * `issuer` - The issuer claim value
    #[must_use]
    pub fn new(signing_key: Arc<SigningKeyPair>, issuer: impl Into<String>) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
        }
    }

    /// Encodes claims into a JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let mut header = Header::new(self.signing_key.algorithm.to_jwt_algorithm());
        header.kid = Some(self.signing_key.kid.clone());

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Decodes a JWT, verifying algorithm, signature and issuer.
    ///
    /// Time-based claims are not checked here; see [`check_time_window`].
    ///
    /// # Errors
    /// Returns `JwtError::AlgorithmMismatch` if the header algorithm differs
    /// from the active key's, or another error if decoding or verification
    /// fails.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<TokenData<T>, JwtError> {
        let expected = self.signing_key.algorithm.to_jwt_algorithm();
        let header = decode_header(token)?;
        if header.alg != expected {
            return Err(JwtError::AlgorithmMismatch {
                expected: self.signing_key.algorithm.to_string(),
                found: format!("{:?}", header.alg),
            });
        }

        let mut validation = Validation::new(expected);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        decode(token, &self.signing_key.decoding_key, &validation).map_err(JwtError::from)
    }
}

// ============================================================================
// Tests
// ============================================================================
