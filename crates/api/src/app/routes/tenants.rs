use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use tenantchat_core::Tenant;

use crate::app::dto::{CreateTenantRequest, JsonBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

#[instrument(skip_all)]
pub async fn create_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<CreateTenantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = Tenant::new(&body.name)?;
    let tenant = services.store.create_tenant(tenant).await?;

    tracing::info!(tenant_id = %tenant.id, "tenant created");
    Ok((StatusCode::CREATED, Json(tenant)))
}

pub async fn list_tenants(Extension(services): Extension<Arc<AppServices>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(services.store.list_tenants().await?))
}
