//! Infrastructure layer: credential storage and the external chat provider.

pub mod provider;
pub mod store;

pub use provider::{
    ChatProvider, InMemoryChatProvider, ProviderError, ProviderOperation, StreamChatClient, StreamConfig,
};
pub use store::{CredentialStore, InMemoryCredentialStore, PostgresCredentialStore, Registration, StoreError};
