//! External chat provider port.
//!
//! The provider owns conversations and message history; this service only
//! mirrors identities and keeps a local row per conversation.

use chrono::{DateTime, Utc};
use thiserror::Error;

use tenantchat_auth::User;
use tenantchat_channels::{Message, NewChannel, NewMessage};
use tenantchat_core::UserId;

pub mod in_memory;
pub mod stream;

pub use in_memory::{InMemoryChatProvider, ProviderOperation};
pub use stream::{StreamChatClient, StreamConfig};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider unreachable: {0}")]
    Transport(String),

    #[error("unexpected provider response: {0}")]
    Decode(String),

    #[error("failed to sign provider token: {0}")]
    Token(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Create or update the provider identity for `user`.
    async fn upsert_user(&self, user: &User) -> Result<(), ProviderError>;

    /// Create conversation `channel_id` with the creator as its only member.
    /// Returns the id the provider confirmed.
    async fn create_channel(&self, channel_id: &str, channel: &NewChannel) -> Result<String, ProviderError>;

    /// Remove a conversation. Used to undo a create whose local row failed.
    async fn delete_channel(&self, channel_id: &str) -> Result<(), ProviderError>;

    /// Sign a client token the user can present to the provider directly.
    fn issue_user_token(&self, user_id: UserId, expires_at: DateTime<Utc>) -> Result<String, ProviderError>;

    async fn send_message(&self, channel_id: &str, message: &NewMessage) -> Result<Message, ProviderError>;

    /// Recent messages of a conversation, oldest first.
    async fn query_messages(&self, channel_id: &str) -> Result<Vec<Message>, ProviderError>;
}
