//! Tenant record: the root isolation scope.

use serde::{Deserialize, Serialize};

use crate::error::{DomainResult, require_non_empty};
use crate::{Entity, TenantId};

/// An organization. Every user and channel belongs to exactly one.
///
/// The name is globally unique (enforced by the store); neither field changes
/// after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
}

impl Tenant {
    /// Build a new tenant with a fresh id from an untrusted display name.
    pub fn new(name: &str) -> DomainResult<Self> {
        Ok(Self {
            id: TenantId::new(),
            name: require_non_empty("tenant name", name)?,
        })
    }
}

impl Entity for Tenant {
    type Id = TenantId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainError;

    #[test]
    fn new_trims_name() {
        let tenant = Tenant::new(" Acme ").unwrap();
        assert_eq!(tenant.name, "Acme");
    }

    #[test]
    fn new_rejects_empty_name() {
        assert!(matches!(Tenant::new(""), Err(DomainError::Validation(_))));
    }
}
