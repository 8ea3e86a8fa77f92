//! Entity trait: identity + tenant ownership.

use crate::TenantId;

/// A persisted record with a stable identity.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity that lives inside exactly one tenant.
///
/// Stores use this to reject rows whose tenant does not match the caller's.
pub trait TenantScoped: Entity {
    fn tenant_id(&self) -> TenantId;

    fn belongs_to(&self, tenant_id: TenantId) -> bool {
        self.tenant_id() == tenant_id
    }
}
