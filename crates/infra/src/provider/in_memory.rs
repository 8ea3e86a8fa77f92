use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use tenantchat_auth::User;
use tenantchat_channels::{Message, NewChannel, NewMessage};
use tenantchat_core::UserId;

use super::{ChatProvider, ProviderError};

/// Provider calls that can be made to fail on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOperation {
    UpsertUser,
    CreateChannel,
    DeleteChannel,
    IssueToken,
    SendMessage,
    QueryMessages,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, User>,
    channels: HashMap<String, Vec<Message>>,
    failing: HashSet<ProviderOperation>,
    next_message: u64,
}

/// In-process chat provider for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryChatProvider {
    inner: Mutex<State>,
}

impl InMemoryChatProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later call of `operation` fail until [`Self::recover`].
    pub fn fail(&self, operation: ProviderOperation) {
        if let Ok(mut state) = self.inner.lock() {
            state.failing.insert(operation);
        }
    }

    pub fn recover(&self, operation: ProviderOperation) {
        if let Ok(mut state) = self.inner.lock() {
            state.failing.remove(&operation);
        }
    }

    pub fn has_user(&self, user_id: UserId) -> bool {
        self.inner
            .lock()
            .map(|s| s.users.contains_key(&user_id))
            .unwrap_or(false)
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.inner
            .lock()
            .map(|s| s.channels.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn enter(&self, operation: ProviderOperation) -> Result<MutexGuard<'_, State>, ProviderError> {
        let state = self
            .inner
            .lock()
            .map_err(|_| ProviderError::Unavailable("in-memory provider lock poisoned".to_string()))?;
        if state.failing.contains(&operation) {
            return Err(ProviderError::Unavailable(format!("{operation:?} failure injected")));
        }
        Ok(state)
    }
}

fn unknown_channel(channel_id: &str) -> ProviderError {
    ProviderError::Status {
        status: 404,
        body: format!("channel '{channel_id}' does not exist"),
    }
}

#[async_trait::async_trait]
impl ChatProvider for InMemoryChatProvider {
    async fn upsert_user(&self, user: &User) -> Result<(), ProviderError> {
        let mut state = self.enter(ProviderOperation::UpsertUser)?;
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn create_channel(&self, channel_id: &str, _channel: &NewChannel) -> Result<String, ProviderError> {
        let mut state = self.enter(ProviderOperation::CreateChannel)?;
        state.channels.entry(channel_id.to_string()).or_default();
        Ok(channel_id.to_string())
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), ProviderError> {
        let mut state = self.enter(ProviderOperation::DeleteChannel)?;
        state
            .channels
            .remove(channel_id)
            .map(|_| ())
            .ok_or_else(|| unknown_channel(channel_id))
    }

    fn issue_user_token(&self, user_id: UserId, expires_at: DateTime<Utc>) -> Result<String, ProviderError> {
        drop(self.enter(ProviderOperation::IssueToken)?);
        Ok(format!("in-memory.{user_id}.{}", expires_at.timestamp()))
    }

    async fn send_message(&self, channel_id: &str, message: &NewMessage) -> Result<Message, ProviderError> {
        let mut state = self.enter(ProviderOperation::SendMessage)?;
        state.next_message += 1;
        let sent = Message {
            id: format!("msg-{}", state.next_message),
            text: message.text.clone(),
            user_id: message.user_id.to_string(),
            created_at: Some(Utc::now()),
        };
        let history = state
            .channels
            .get_mut(channel_id)
            .ok_or_else(|| unknown_channel(channel_id))?;
        history.push(sent.clone());
        Ok(sent)
    }

    async fn query_messages(&self, channel_id: &str) -> Result<Vec<Message>, ProviderError> {
        let state = self.enter(ProviderOperation::QueryMessages)?;
        state
            .channels
            .get(channel_id)
            .cloned()
            .ok_or_else(|| unknown_channel(channel_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantchat_core::TenantId;

    fn new_channel() -> NewChannel {
        NewChannel::new("general", None, TenantId::new(), UserId::new()).unwrap()
    }

    #[tokio::test]
    async fn messages_are_kept_per_channel_in_order() {
        let provider = InMemoryChatProvider::new();
        let channel = new_channel();
        let id = provider.create_channel("t-1", &channel).await.unwrap();

        for text in ["one", "two"] {
            let msg = NewMessage::new(text, channel.created_by).unwrap();
            provider.send_message(&id, &msg).await.unwrap();
        }

        let history = provider.query_messages(&id).await.unwrap();
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert_eq!(history[0].user_id, channel.created_by.to_string());
    }

    #[tokio::test]
    async fn injected_failures_apply_until_recovered() {
        let provider = InMemoryChatProvider::new();
        provider.fail(ProviderOperation::CreateChannel);

        let err = provider.create_channel("t-1", &new_channel()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
        assert!(provider.channel_ids().is_empty());

        provider.recover(ProviderOperation::CreateChannel);
        provider.create_channel("t-1", &new_channel()).await.unwrap();
        assert_eq!(provider.channel_ids(), vec!["t-1".to_string()]);
    }

    #[tokio::test]
    async fn user_tokens_do_not_hold_the_provider_lock() {
        let provider = InMemoryChatProvider::new();
        let user_id = UserId::new();
        let expires_at = Utc::now();

        let token = provider.issue_user_token(user_id, expires_at).unwrap();
        assert_eq!(token, format!("in-memory.{user_id}.{}", expires_at.timestamp()));

        provider.fail(ProviderOperation::IssueToken);
        assert!(provider.issue_user_token(user_id, expires_at).is_err());
        provider.recover(ProviderOperation::IssueToken);

        provider.create_channel("t-1", &new_channel()).await.unwrap();
        assert!(provider.issue_user_token(user_id, expires_at).is_ok());
    }

    #[tokio::test]
    async fn unknown_channel_is_a_status_error() {
        let provider = InMemoryChatProvider::new();
        let err = provider.query_messages("missing").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 404, .. }));
    }
}
