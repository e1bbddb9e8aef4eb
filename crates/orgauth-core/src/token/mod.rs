//! Token generation, validation and revocation.
//!
//! - [`jwt`] - JWT encoding/decoding and signing keys
//! - [`keys`] - Named signing key registry
//! - [`service`] - Access/refresh token issuance and refresh token records

pub mod jwt;
pub mod keys;
pub mod service;

pub use jwt::{
    AccessTokenClaims, JwtError, JwtService, RefreshTokenClaims, SigningAlgorithm, SigningKeyPair,
};
pub use keys::KeyManager;
pub use service::{TokenConfig, TokenService};
