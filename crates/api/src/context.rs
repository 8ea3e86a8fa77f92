use tenantchat_auth::{Principal, Role, SessionClaims};
use tenantchat_core::{TenantId, UserId};

/// Tenant context for a request.
///
/// Taken from verified claims only; must be present for all tenant-scoped routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Principal context for a request (authenticated identity + role).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Combine with the request's tenant into the policy-level principal.
    pub fn principal(&self, tenant: TenantContext) -> Principal {
        Principal {
            user_id: self.user_id,
            tenant_id: tenant.tenant_id(),
            role: self.role,
        }
    }
}

impl From<&SessionClaims> for PrincipalContext {
    fn from(claims: &SessionClaims) -> Self {
        Self::new(claims.user_id, claims.role)
    }
}
