//! Credential store: tenants, users and channel rows.
//!
//! Every user/channel query takes the caller's `TenantId`; the only
//! tenant-agnostic calls are tenant creation/listing, login lookup by email
//! and channel lookup by id (callers must run `ensure_tenant` on the result).

use thiserror::Error;

use tenantchat_auth::{User, UserDraft, UserPatch};
use tenantchat_channels::Channel;
use tenantchat_core::{ChannelId, Tenant, TenantId, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A tenant with this name already exists.
    #[error("tenant '{0}' already exists")]
    DuplicateTenant(String),

    /// A uniqueness constraint rejected the write (email, stream id).
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Outcome of a registration write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub tenant: Tenant,
    pub user: User,
}

#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn create_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError>;

    /// All tenants, ordered by name.
    async fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError>;

    /// Create `tenant` and its first user. Both writes commit together or not
    /// at all; an existing tenant name is `DuplicateTenant` and writes nothing.
    async fn register(&self, tenant: Tenant, user: UserDraft) -> Result<Registration, StoreError>;

    async fn create_user(&self, user: User) -> Result<User, StoreError>;

    /// Login lookup. Emails are unique across tenants.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn get_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<Option<User>, StoreError>;

    /// Users of one tenant, ordered by email.
    async fn list_users(&self, tenant_id: TenantId) -> Result<Vec<User>, StoreError>;

    /// Apply `patch` to a user of `tenant_id`; `None` when no such user exists there.
    async fn update_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, StoreError>;

    /// `true` if a row of `tenant_id` was removed.
    async fn delete_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, StoreError>;

    async fn create_channel(&self, channel: Channel) -> Result<Channel, StoreError>;

    /// Channels of one tenant, ordered by name.
    async fn list_channels(&self, tenant_id: TenantId) -> Result<Vec<Channel>, StoreError>;

    async fn find_channel(&self, channel_id: ChannelId) -> Result<Option<Channel>, StoreError>;
}
