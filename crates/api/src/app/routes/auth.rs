use std::sync::Arc;

use axum::{Extension, Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::instrument;

use tenantchat_auth::{NewUser, Role};
use tenantchat_core::Tenant;

use crate::app::dto::{JsonBody, LoginRequest, RegisterRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Exchange email + password for a session token.
///
/// Unknown email and wrong password produce the same response.
#[instrument(skip_all)]
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.trim().to_lowercase();

    let user = services
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !user.check_password(&body.password)? {
        tracing::debug!(user_id = %user.id, "password mismatch");
        return Err(ApiError::InvalidCredentials);
    }

    let token = services.tokens.issue(&user)?;
    tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id, "login succeeded");

    Ok(Json(json!({ "token": token })))
}

/// Self-service sign-up: creates the tenant named `org_name` with the caller
/// as its first user.
///
/// A taken `org_name` is a 409 and nothing is written. Further users join an
/// existing tenant through `POST /users`.
#[instrument(skip_all)]
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let role: Role = body.role.parse()?;
    let tenant = Tenant::new(&body.org_name)?;
    let draft = NewUser::new(&body.email, &body.name, &body.password, role)?.hash()?;

    let registration = services
        .store
        .register(tenant, draft)
        .await
        .map_err(|e| ApiError::from_store(e, "Email already registered"))?;
    let user = registration.user;

    tracing::info!(
        user_id = %user.id,
        tenant_id = %registration.tenant.id,
        "tenant and first user registered"
    );

    // The account is usable without a provider identity; chat calls will
    // fail until it is synced, so flag it instead of failing sign-up.
    if let Err(e) = services.provider.upsert_user(&user).await {
        tracing::error!(
            user_id = %user.id,
            tenant_id = %user.tenant_id,
            error = %e,
            reconciliation = "unsynced_provider_identity",
            "provider identity not created for registered user"
        );
    }

    let token = services.tokens.issue(&user)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": user.id,
            "email": user.email,
            "role": user.role,
            "tenant_id": user.tenant_id,
            "token": token,
        })),
    ))
}
