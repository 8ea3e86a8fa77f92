//! `tenantchat-core` — identifiers, the tenant record and the domain error model.
//!
//! No IO lives here; every other crate in the workspace builds on these types.

pub mod entity;
pub mod error;
pub mod id;
pub mod tenant;

pub use entity::{Entity, TenantScoped};
pub use error::{DomainError, DomainResult};
pub use id::{ChannelId, TenantId, UserId};
pub use tenant::Tenant;
