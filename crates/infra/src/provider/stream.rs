//! REST client for a Stream-compatible chat API.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header};
use reqwest::Method;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;
use tracing::instrument;

use tenantchat_auth::User;
use tenantchat_channels::{CHANNEL_TYPE, Message, NewChannel, NewMessage};
use tenantchat_core::UserId;

use super::{ChatProvider, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://chat.stream-io-api.com";

#[derive(Clone)]
pub struct StreamConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for StreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Serialize)]
struct UserTokenClaims<'a> {
    user_id: &'a str,
    exp: i64,
}

#[derive(serde::Deserialize)]
struct ChannelEnvelope {
    channel: ChannelBody,
}

#[derive(serde::Deserialize)]
struct ChannelBody {
    id: String,
}

#[derive(serde::Deserialize)]
struct MessageEnvelope {
    message: StreamMessage,
}

#[derive(serde::Deserialize)]
struct MessagesEnvelope {
    #[serde(default)]
    messages: Vec<StreamMessage>,
}

#[derive(serde::Deserialize)]
struct StreamMessage {
    id: String,
    #[serde(default)]
    text: String,
    user: Option<StreamUser>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(serde::Deserialize)]
struct StreamUser {
    id: String,
}

impl From<StreamMessage> for Message {
    fn from(m: StreamMessage) -> Self {
        Message {
            id: m.id,
            text: m.text,
            user_id: m.user.map(|u| u.id).unwrap_or_default(),
            created_at: m.created_at,
        }
    }
}

/// Chat provider backed by the Stream REST API.
///
/// Server calls authenticate with a long-lived `{"server": true}` JWT signed
/// by the API secret; user tokens are signed by the same secret.
pub struct StreamChatClient {
    http: reqwest::Client,
    config: StreamConfig,
    signing_key: EncodingKey,
    server_token: String,
}

impl std::fmt::Debug for StreamChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamChatClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StreamChatClient {
    pub fn new(config: StreamConfig) -> Result<Self, ProviderError> {
        let signing_key = EncodingKey::from_secret(config.api_secret.as_bytes());
        let server_token = jsonwebtoken::encode(&Header::default(), &json!({ "server": true }), &signing_key)
            .map_err(|e| ProviderError::Token(e.to_string()))?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            config,
            signing_key,
            server_token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn channel_path(channel_id: &str, suffix: &str) -> String {
        format!("/channels/{CHANNEL_TYPE}/{channel_id}{suffix}")
    }

    async fn call<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let mut request = self
            .http
            .request(method, self.endpoint(path))
            .query(&[("api_key", self.config.api_key.as_str())])
            .header("Authorization", &self.server_token)
            .header("Stream-Auth-Type", "jwt");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ChatProvider for StreamChatClient {
    #[instrument(skip(self, user), fields(user_id = %user.id, tenant_id = %user.tenant_id), err)]
    async fn upsert_user(&self, user: &User) -> Result<(), ProviderError> {
        let id = user.id.to_string();
        let body = json!({
            "users": {
                id.clone(): {
                    "id": id,
                    "name": user.name,
                    "app_role": user.role.as_str(),
                    "tenant_id": user.tenant_id.to_string(),
                    "email": user.email,
                }
            }
        });
        let _: IgnoredAny = self.call(Method::POST, "/users", Some(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self, channel), fields(tenant_id = %channel.tenant_id), err)]
    async fn create_channel(&self, channel_id: &str, channel: &NewChannel) -> Result<String, ProviderError> {
        let creator = channel.created_by.to_string();
        let body = json!({
            "data": {
                "created_by_id": creator,
                "members": [creator],
                "tenant_id": channel.tenant_id.to_string(),
                "name": channel.name,
                "description": channel.description,
            }
        });
        let created: ChannelEnvelope = self
            .call(Method::POST, &Self::channel_path(channel_id, "/query"), Some(&body))
            .await?;
        Ok(created.channel.id)
    }

    #[instrument(skip(self), err)]
    async fn delete_channel(&self, channel_id: &str) -> Result<(), ProviderError> {
        let _: IgnoredAny = self
            .call::<_, ()>(Method::DELETE, &Self::channel_path(channel_id, ""), None)
            .await?;
        Ok(())
    }

    fn issue_user_token(&self, user_id: UserId, expires_at: DateTime<Utc>) -> Result<String, ProviderError> {
        let user_id = user_id.to_string();
        let claims = UserTokenClaims {
            user_id: &user_id,
            exp: expires_at.timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.signing_key)
            .map_err(|e| ProviderError::Token(e.to_string()))
    }

    #[instrument(skip(self, message), fields(user_id = %message.user_id), err)]
    async fn send_message(&self, channel_id: &str, message: &NewMessage) -> Result<Message, ProviderError> {
        let body = json!({
            "message": {
                "text": message.text,
                "user_id": message.user_id.to_string(),
            }
        });
        let sent: MessageEnvelope = self
            .call(Method::POST, &Self::channel_path(channel_id, "/message"), Some(&body))
            .await?;
        Ok(sent.message.into())
    }

    #[instrument(skip(self), err)]
    async fn query_messages(&self, channel_id: &str) -> Result<Vec<Message>, ProviderError> {
        let body = json!({ "state": true });
        let state: MessagesEnvelope = self
            .call(Method::POST, &Self::channel_path(channel_id, "/query"), Some(&body))
            .await?;
        Ok(state.messages.into_iter().map(Message::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

    fn client(base_url: &str) -> StreamChatClient {
        StreamChatClient::new(StreamConfig {
            api_key: "key".to_string(),
            api_secret: "provider-secret".to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    #[test]
    fn server_token_is_signed_with_the_api_secret() {
        let client = client(DEFAULT_BASE_URL);
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;

        let data = decode::<serde_json::Value>(
            &client.server_token,
            &DecodingKey::from_secret(b"provider-secret"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims["server"], true);
    }

    #[test]
    fn user_token_carries_user_id_and_expiry() {
        let client = client(DEFAULT_BASE_URL);
        let user_id = UserId::new();
        let expires_at = Utc::now() + chrono::Duration::hours(24);

        let token = client.issue_user_token(user_id, expires_at).unwrap();
        let data = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"provider-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims["user_id"], user_id.to_string());
        assert_eq!(data.claims["exp"], expires_at.timestamp());
    }

    #[test]
    fn endpoints_use_messaging_channel_type() {
        let client = client("http://provider.local/");
        assert_eq!(
            client.endpoint(&StreamChatClient::channel_path("t-1", "/query")),
            "http://provider.local/channels/messaging/t-1/query"
        );
    }

    #[test]
    fn provider_messages_map_to_domain_messages() {
        let raw = r#"{"messages":[{"id":"m1","text":"hi","user":{"id":"u1"},"created_at":"2024-01-01T00:00:00Z"},{"id":"m2"}]}"#;
        let parsed: MessagesEnvelope = serde_json::from_str(raw).unwrap();
        let messages: Vec<Message> = parsed.messages.into_iter().map(Message::from).collect();
        assert_eq!(messages[0].user_id, "u1");
        assert!(messages[0].created_at.is_some());
        assert_eq!(messages[1].text, "");
        assert_eq!(messages[1].user_id, "");
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_transport_error() {
        let client = client("http://127.0.0.1:1");
        let err = client.delete_channel("t-1").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport(_)));
    }
}
