use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use tenantchat_auth::TokenService;
use tenantchat_infra::{
    ChatProvider, CredentialStore, InMemoryChatProvider, InMemoryCredentialStore, PostgresCredentialStore,
    StreamChatClient,
};

use crate::config::AppConfig;

/// Shared collaborators handed to every handler through an `Extension`.
#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn CredentialStore>,
    pub provider: Arc<dyn ChatProvider>,
    pub tokens: Arc<TokenService>,
}

impl AppServices {
    pub fn new(store: Arc<dyn CredentialStore>, provider: Arc<dyn ChatProvider>, tokens: TokenService) -> Self {
        Self {
            store,
            provider,
            tokens: Arc::new(tokens),
        }
    }

    /// Fully in-process wiring (no database, no provider network calls).
    pub fn in_memory(tokens: TokenService) -> Self {
        Self::new(
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryChatProvider::new()),
            tokens,
        )
    }

    /// Startup wiring: Postgres when `DATABASE_URL` is set, the REST provider
    /// when credentials are set, in-memory adapters otherwise.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.jwt_secret).context("failed to build token service")?;

        let store: Arc<dyn CredentialStore> = match &config.database_url {
            Some(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .acquire_timeout(Duration::from_secs(5))
                    .connect(url)
                    .await
                    .context("failed to connect to Postgres")?;
                let store = PostgresCredentialStore::new(pool);
                if config.migrate_db {
                    store.migrate().await.context("schema migration failed")?;
                    tracing::info!("database schema is up to date");
                }
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set; using in-memory credential store");
                Arc::new(InMemoryCredentialStore::new())
            }
        };

        let provider: Arc<dyn ChatProvider> = match config.stream_config() {
            Some(stream) => {
                tracing::info!(base_url = %stream.base_url, "using Stream chat provider");
                Arc::new(StreamChatClient::new(stream).context("failed to build chat provider client")?)
            }
            None => {
                tracing::warn!("STREAM_API_KEY not set; using in-memory chat provider");
                Arc::new(InMemoryChatProvider::new())
            }
        };

        Ok(Self::new(store, provider, tokens))
    }
}
