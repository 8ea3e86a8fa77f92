//! Channel records.
//!
//! A channel row is the local mirror of a conversation that already exists at
//! the chat provider. It is only ever built from the provider-assigned id
//! returned by a successful create, so a row never points at nothing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tenantchat_core::error::require_non_empty;
use tenantchat_core::{ChannelId, DomainResult, Entity, TenantId, TenantScoped, UserId};

/// Provider conversation type used for every tenant channel.
pub const CHANNEL_TYPE: &str = "messaging";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    /// Provider conversation id.
    pub stream_id: String,
    pub name: String,
    pub description: String,
    pub tenant_id: TenantId,
    pub created_by: UserId,
}

impl Entity for Channel {
    type Id = ChannelId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for Channel {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Validated channel request, scoped to the creator's tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChannel {
    pub name: String,
    pub description: String,
    pub tenant_id: TenantId,
    pub created_by: UserId,
}

impl NewChannel {
    pub fn new(
        name: &str,
        description: Option<&str>,
        tenant_id: TenantId,
        created_by: UserId,
    ) -> DomainResult<Self> {
        Ok(Self {
            name: require_non_empty("channel name", name)?,
            description: description.map(str::trim).unwrap_or_default().to_string(),
            tenant_id,
            created_by,
        })
    }

    /// Conversation id to request from the provider: `{tenant}-{uuid}`.
    pub fn provider_channel_id(&self) -> String {
        format!("{}-{}", self.tenant_id, Uuid::new_v4())
    }

    /// Build the local row once the provider has confirmed `stream_id`.
    pub fn into_channel(self, stream_id: String) -> Channel {
        Channel {
            id: ChannelId::new(),
            stream_id,
            name: self.name,
            description: self.description,
            tenant_id: self.tenant_id,
            created_by: self.created_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_id_is_prefixed_by_tenant() {
        let tenant = TenantId::new();
        let channel = NewChannel::new("general", None, tenant, UserId::new()).unwrap();

        let a = channel.provider_channel_id();
        let b = channel.provider_channel_id();

        assert!(a.starts_with(&format!("{tenant}-")));
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_blank_name() {
        assert!(NewChannel::new("  ", Some("x"), TenantId::new(), UserId::new()).is_err());
    }

    #[test]
    fn into_channel_keeps_scope() {
        let tenant = TenantId::new();
        let creator = UserId::new();
        let channel = NewChannel::new("general", Some(" talk "), tenant, creator)
            .unwrap()
            .into_channel("stream-1".to_string());

        assert_eq!(channel.stream_id, "stream-1");
        assert_eq!(channel.description, "talk");
        assert!(channel.belongs_to(tenant));
        assert_eq!(channel.created_by, creator);
    }
}
