use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use tenantchat_auth::ensure_tenant;
use tenantchat_channels::{Channel, NewMessage};
use tenantchat_core::ChannelId;

use crate::app::dto::{JsonBody, SendMessageRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

/// Resolve a local channel id the caller's tenant owns.
///
/// Channels of other tenants are reported exactly like missing ones.
async fn owned_channel(
    services: &AppServices,
    tenant: TenantContext,
    principal: &PrincipalContext,
    raw_id: &str,
) -> Result<Channel, ApiError> {
    let channel_id: ChannelId = raw_id.parse()?;
    let channel = services
        .store
        .find_channel(channel_id)
        .await?
        .ok_or(ApiError::NotFound("channel"))?;

    ensure_tenant(&principal.principal(tenant), channel.tenant_id).map_err(|_| {
        tracing::info!(%channel_id, "cross-tenant channel access refused");
        ApiError::NotFound("channel")
    })?;

    Ok(channel)
}

#[instrument(skip_all, fields(tenant_id = %tenant.tenant_id(), user_id = %principal.user_id()))]
pub async fn send_message(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    JsonBody(body): JsonBody<SendMessageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = owned_channel(&services, tenant, &principal, &body.channel_id).await?;
    let message = NewMessage::new(&body.text, principal.user_id())?;

    let sent = services.provider.send_message(&channel.stream_id, &message).await?;
    Ok((StatusCode::CREATED, Json(sent)))
}

#[instrument(skip_all, fields(tenant_id = %tenant.tenant_id(), channel_id = %channel_id))]
pub async fn list_messages(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(channel_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let channel = owned_channel(&services, tenant, &principal, &channel_id).await?;
    let messages = services.provider.query_messages(&channel.stream_id).await?;
    Ok(Json(json!({ "messages": messages })))
}
