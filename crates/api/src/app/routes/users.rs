use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::instrument;

use tenantchat_auth::{NewUser, Role, UserPatch};
use tenantchat_core::UserId;

use crate::app::dto::{CreateUserRequest, JsonBody, UpdateUserRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::TenantContext;

/// Create a user in the caller's tenant and mirror it to the chat provider.
///
/// The local row is written first; if the provider rejects the identity the
/// row is removed again so the two sides never disagree.
#[instrument(skip_all, fields(tenant_id = %tenant.tenant_id()))]
pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    JsonBody(body): JsonBody<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role: Role = body.role.parse()?;
    let user = NewUser::new(&body.email, &body.name, &body.password, role)?
        .hash()?
        .into_user(tenant.tenant_id());

    let user = services
        .store
        .create_user(user)
        .await
        .map_err(|e| ApiError::from_store(e, "Email already registered"))?;

    if let Err(e) = services.provider.upsert_user(&user).await {
        tracing::error!(user_id = %user.id, error = %e, "provider rejected user identity");
        if let Err(cleanup) = services.store.delete_user(user.tenant_id, user.id).await {
            tracing::error!(
                user_id = %user.id,
                error = %cleanup,
                reconciliation = "unsynced_provider_identity",
                "failed to remove user after provider sync failure"
            );
        }
        return Err(ApiError::Dependency("failed to sync user with chat provider"));
    }

    tracing::info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(services.store.list_users(tenant.tenant_id()).await?))
}

#[instrument(skip_all, fields(tenant_id = %tenant.tenant_id(), user_id = %id))]
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id: UserId = id.parse()?;
    let role = body.role.as_deref().map(str::parse::<Role>).transpose()?;
    let patch = UserPatch::new(body.name.as_deref(), body.email.as_deref(), role)?;

    let user = if patch.is_empty() {
        services.store.get_user(tenant.tenant_id(), user_id).await?
    } else {
        services
            .store
            .update_user(tenant.tenant_id(), user_id, &patch)
            .await
            .map_err(|e| ApiError::from_store(e, "Email already registered"))?
    };
    let user = user.ok_or(ApiError::NotFound("user"))?;

    if !patch.is_empty() {
        // Keep the provider's copy of name/role current; the local row is authoritative.
        if let Err(e) = services.provider.upsert_user(&user).await {
            tracing::error!(
                user_id = %user.id,
                error = %e,
                reconciliation = "unsynced_provider_identity",
                "provider identity not updated"
            );
        }
    }

    Ok(Json(user))
}

#[instrument(skip_all, fields(tenant_id = %tenant.tenant_id(), user_id = %id))]
pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id: UserId = id.parse()?;

    if !services.store.delete_user(tenant.tenant_id(), user_id).await? {
        return Err(ApiError::NotFound("user"));
    }

    tracing::info!("user deleted");
    Ok(Json(json!({ "deleted": true })))
}
