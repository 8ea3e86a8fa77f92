use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use tenantchat_auth::{PasswordError, TokenError, UnknownRole};
use tenantchat_core::DomainError;
use tenantchat_infra::{ProviderError, StoreError};

/// Every failure a handler or middleware can surface to a client.
///
/// Dependency failures are logged where they are converted; the client only
/// sees the generic message carried here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Dependency(&'static str),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingToken | ApiError::InvalidToken | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::MissingToken | ApiError::InvalidToken | ApiError::InvalidCredentials => "authentication",
            ApiError::Forbidden => "authorization",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Dependency(_) => "dependency",
        }
    }

    /// Store failure with a caller-chosen message for the row's own
    /// uniqueness conflict. Tenant-name clashes always read the same.
    pub fn from_store(err: StoreError, conflict: &str) -> Self {
        match err {
            StoreError::DuplicateTenant(name) => {
                tracing::debug!(%name, "tenant name conflict");
                ApiError::Conflict("Organization already exists".to_string())
            }
            StoreError::Conflict(detail) => {
                tracing::debug!(%detail, "uniqueness conflict");
                ApiError::Conflict(conflict.to_string())
            }
            StoreError::Backend(_) => err.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status(), self.kind(), self.to_string())
    }
}

pub fn json_error(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": message.into(),
            "kind": kind,
        })),
    )
        .into_response()
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<UnknownRole> for ApiError {
    fn from(err: UnknownRole) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateTenant(_) | StoreError::Conflict(_) => {
                ApiError::from_store(err, "resource already exists")
            }
            StoreError::Backend(cause) => {
                tracing::error!(%cause, "credential store failure");
                ApiError::Dependency("storage unavailable")
            }
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        tracing::error!(error = %err, "chat provider failure");
        ApiError::Dependency("chat provider request failed")
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        tracing::error!(error = %err, "password hashing failure");
        ApiError::Dependency("credential processing failed")
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        tracing::error!(error = %err, "session token signing failure");
        ApiError::Dependency("failed to issue token")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_share_one_kind() {
        for err in [ApiError::MissingToken, ApiError::InvalidToken, ApiError::InvalidCredentials] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.kind(), "authentication");
        }
    }

    #[test]
    fn store_conflict_maps_to_409_with_caller_message() {
        let err = ApiError::from_store(StoreError::Conflict("users_email_key".into()), "Email already registered");
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[test]
    fn tenant_name_conflict_keeps_its_own_message() {
        let err = ApiError::from_store(StoreError::DuplicateTenant("Acme".into()), "Email already registered");
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.to_string(), "Organization already exists");
    }

    #[test]
    fn backend_details_do_not_reach_the_client() {
        let err = ApiError::from(StoreError::Backend("password=hunter2 host=db".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn invalid_role_is_a_validation_error() {
        let err = ApiError::from(UnknownRole("OWNER".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "validation");
    }
}
