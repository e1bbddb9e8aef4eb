//! PKCE (Proof Key for Code Exchange) verification.
//!
//! Supports the `plain` and `S256` methods from RFC 7636. An empty method is
//! treated as `plain`. Every other method is rejected.
//!
//! # Example
//!
//! ```
//! use orgauth_core::oauth::pkce::{CodeChallengeMethod, s256_challenge, verify_code_verifier};
//!
//! let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
//! let challenge = s256_challenge(verifier);
//! assert_eq!(challenge, "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
//!
//! assert!(verify_code_verifier(CodeChallengeMethod::S256, &challenge, verifier).is_ok());
//! assert!(verify_code_verifier(CodeChallengeMethod::S256, &challenge, "other").is_err());
//! ```

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during PKCE verification.
#[derive(Debug, thiserror::Error)]
pub enum PkceError {
    /// The challenge method is not `plain` or `S256`.
    #[error("Unsupported challenge method: {0}")]
    UnsupportedMethod(String),

    /// The verifier does not match the challenge.
    #[error("PKCE verification failed: verifier does not match challenge")]
    VerificationFailed,
}

impl From<PkceError> for AuthError {
    fn from(err: PkceError) -> Self {
        match err {
            PkceError::UnsupportedMethod(method) => AuthError::invalid_code_challenge_method(method),
            PkceError::VerificationFailed => AuthError::InvalidCodeVerifier,
        }
    }
}

// =============================================================================
// Challenge Method
// =============================================================================

/// PKCE code challenge method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CodeChallengeMethod {
    /// The challenge is the verifier itself.
    #[default]
    Plain,
    /// The challenge is base64url(SHA-256(verifier)) without padding.
    S256,
}

impl CodeChallengeMethod {
    /// Parses a challenge method. An empty string means `plain`.
    ///
    /// # Errors
    ///
    /// Returns `PkceError::UnsupportedMethod` for anything other than `""`,
    /// `"plain"` or `"S256"`.
    pub fn parse(method: &str) -> Result<Self, PkceError> {
        match method {
            "" | "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            other => Err(PkceError::UnsupportedMethod(other.to_string())),
        }
    }

    /// Returns the method name as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }
}

impl std::fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Verification
// =============================================================================

/// Computes the S256 challenge for a verifier.
#[must_use]
pub fn s256_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Checks a code verifier against the challenge stored at authorize time.
///
/// # Errors
///
/// Returns `PkceError::VerificationFailed` on mismatch.
pub fn verify_code_verifier(
    method: CodeChallengeMethod,
    challenge: &str,
    verifier: &str,
) -> Result<(), PkceError> {
    let matches = match method {
        CodeChallengeMethod::Plain => challenge == verifier,
        CodeChallengeMethod::S256 => s256_challenge(verifier) == challenge,
    };

    if matches {
        Ok(())
    } else {
        Err(PkceError::VerificationFailed)
    }
}
