use tenantchat_core::{TenantId, UserId};

use crate::{Role, SessionClaims};

/// Verified identity acting within a single tenant.
///
/// Always derived from [`SessionClaims`] that passed signature and expiry
/// checks; never from request bodies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub tenant_id: TenantId,
    pub role: Role,
}

impl From<&SessionClaims> for Principal {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            role: claims.role,
        }
    }
}
