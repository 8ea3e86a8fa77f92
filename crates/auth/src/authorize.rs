//! Role and tenant policy checks.
//!
//! - No IO
//! - No panics
//! - No hierarchy: every route lists each role it admits

use thiserror::Error;

use tenantchat_core::TenantId;

use crate::{Principal, Role};

/// Roles admitted to tenant administration (`POST /tenants`, user deletion).
pub const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// Roles admitted to user and channel management.
pub const STAFF: &[Role] = &[Role::Admin, Role::Moderator];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("role {role} is not permitted (allowed: {allowed:?})")]
    Forbidden { role: Role, allowed: Vec<Role> },

    #[error("tenant mismatch")]
    TenantMismatch,
}

/// Grant access iff the principal's role appears in `allowed`.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&principal.role) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: principal.role,
            allowed: allowed.to_vec(),
        })
    }
}

/// Reject access to a row that belongs to a different tenant.
pub fn ensure_tenant(principal: &Principal, owner: TenantId) -> Result<(), AuthzError> {
    if principal.tenant_id == owner {
        Ok(())
    } else {
        Err(AuthzError::TenantMismatch)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tenantchat_core::UserId;

    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: UserId::new(),
            tenant_id: TenantId::new(),
            role,
        }
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn granted_iff_role_is_listed(
            role in any_role(),
            allowed in prop::collection::vec(any_role(), 0..4),
        ) {
            let granted = require_role(&principal(role), &allowed).is_ok();
            prop_assert_eq!(granted, allowed.contains(&role));
        }
    }

    #[test]
    fn admin_does_not_inherit_moderator_routes() {
        let err = require_role(&principal(Role::Admin), &[Role::Moderator]).unwrap_err();
        assert_eq!(
            err,
            AuthzError::Forbidden {
                role: Role::Admin,
                allowed: vec![Role::Moderator],
            }
        );
    }

    #[test]
    fn staff_excludes_member_and_guest() {
        assert!(require_role(&principal(Role::Member), STAFF).is_err());
        assert!(require_role(&principal(Role::Guest), STAFF).is_err());
        assert!(require_role(&principal(Role::Moderator), STAFF).is_ok());
    }

    #[test]
    fn ensure_tenant_rejects_foreign_rows() {
        let p = principal(Role::Admin);
        assert_eq!(ensure_tenant(&p, p.tenant_id), Ok(()));
        assert_eq!(ensure_tenant(&p, TenantId::new()), Err(AuthzError::TenantMismatch));
    }
}
