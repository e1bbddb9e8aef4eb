//! Organizations (tenants).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Stable identifier.
    pub id: Uuid,

    /// Unique name, used as the `/o/{name}` path segment.
    pub name: String,
}

impl Organization {
    /// Creates an organization with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// The organization a request was resolved to.
///
/// Inserted into request extensions by the tenant resolver. Handlers read
/// the tenant from here and never from client-supplied parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationContext {
    /// Organization id.
    pub id: Uuid,

    /// Organization name as it appears in the path.
    pub name: String,
}

impl From<Organization> for OrganizationContext {
    fn from(org: Organization) -> Self {
        Self {
            id: org.id,
            name: org.name,
        }
    }
}
