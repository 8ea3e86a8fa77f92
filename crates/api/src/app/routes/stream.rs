use std::sync::Arc;

use axum::{Extension, Json, response::IntoResponse};
use chrono::Utc;
use serde_json::json;

use tenantchat_auth::SESSION_TTL_HOURS;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

/// Client token for talking to the chat provider directly, valid for 24h.
pub async fn token(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let expires_at = Utc::now() + chrono::Duration::hours(SESSION_TTL_HOURS);
    let token = services.provider.issue_user_token(principal.user_id(), expires_at)?;

    Ok(Json(json!({
        "token": token,
        "user_id": principal.user_id(),
    })))
}
