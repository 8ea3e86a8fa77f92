use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use tenantchat_channels::NewChannel;

use crate::app::dto::{CreateChannelRequest, JsonBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

/// Create a provider conversation, then record it locally.
///
/// A row is only written for a conversation the provider confirmed. If the
/// write fails the conversation is deleted again.
#[instrument(skip_all, fields(tenant_id = %tenant.tenant_id(), user_id = %principal.user_id()))]
pub async fn create_channel(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<CreateChannelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new = NewChannel::new(
        &body.name,
        body.description.as_deref(),
        tenant.tenant_id(),
        principal.user_id(),
    )?;

    let stream_id = services
        .provider
        .create_channel(&new.provider_channel_id(), &new)
        .await?;

    let channel = match services.store.create_channel(new.into_channel(stream_id.clone())).await {
        Ok(channel) => channel,
        Err(e) => {
            tracing::error!(%stream_id, error = %e, "failed to record provider channel");
            if let Err(cleanup) = services.provider.delete_channel(&stream_id).await {
                tracing::error!(
                    %stream_id,
                    error = %cleanup,
                    reconciliation = "orphaned_provider_channel",
                    "failed to delete provider channel after local write failure"
                );
            }
            return Err(ApiError::from_store(e, "Channel already exists"));
        }
    };

    tracing::info!(channel_id = %channel.id, %stream_id, "channel created");
    Ok((StatusCode::CREATED, Json(channel)))
}

pub async fn list_channels(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(services.store.list_channels(tenant.tenant_id()).await?))
}
