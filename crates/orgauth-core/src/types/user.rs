//! End users.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user account within one organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier, used as the token subject.
    pub id: Uuid,

    /// Owning organization.
    pub organization_id: Uuid,

    /// Login name, unique within the organization.
    pub username: String,

    /// Email address.
    pub email: String,

    /// Argon2 PHC hash of the password.
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A user whose credentials were verified.
///
/// Only produced by successful credential verification or by resuming a
/// live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// User id.
    pub id: Uuid,

    /// Login name.
    pub username: String,

    /// Email address.
    pub email: String,

    /// Organization the user authenticated in.
    pub organization_id: Uuid,
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            organization_id: user.organization_id,
        }
    }
}
