//! Two-stage request guard.
//!
//! `authenticate` turns a bearer token into typed request extensions;
//! `require_roles` checks the resulting principal against a per-route
//! allow-list. Routes layer the second on top of the first.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

use tenantchat_auth::{Role, TokenVerifier, require_role};

use crate::app::errors::ApiError;
use crate::context::{PrincipalContext, TenantContext};

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenVerifier>,
}

pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers()).ok_or(ApiError::MissingToken)?;

    let claims = state.tokens.verify(token).map_err(|e| {
        tracing::debug!(reason = %e, "session token rejected");
        ApiError::InvalidToken
    })?;

    req.extensions_mut().insert(TenantContext::new(claims.tenant_id));
    req.extensions_mut().insert(PrincipalContext::from(&claims));

    Ok(next.run(req).await)
}

/// Allowed roles for one route. Matching is exact: no role implies another.
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard(pub &'static [Role]);

pub async fn require_roles(
    State(RoleGuard(allowed)): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let extensions = req.extensions();
    let (Some(principal), Some(tenant)) = (
        extensions.get::<PrincipalContext>(),
        extensions.get::<TenantContext>(),
    ) else {
        return Err(ApiError::Forbidden);
    };

    if let Err(e) = require_role(&principal.principal(*tenant), allowed) {
        tracing::info!(
            user_id = %principal.user_id(),
            tenant_id = %tenant.tenant_id(),
            path = %req.uri().path(),
            reason = %e,
            "request denied"
        );
        return Err(ApiError::Forbidden);
    }

    Ok(next.run(req).await)
}

/// The token from `Authorization`, with an optional `Bearer ` prefix removed.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &[u8]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_bytes(value).unwrap());
        headers
    }

    #[test]
    fn bearer_prefix_is_optional() {
        assert_eq!(extract_bearer(&headers(b"Bearer abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer(&headers(b"abc.def")), Some("abc.def"));
        assert_eq!(extract_bearer(&headers(b"Bearer   abc ")), Some("abc"));
    }

    #[test]
    fn empty_or_absent_token_is_missing() {
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
        assert_eq!(extract_bearer(&headers(b"Bearer ")), None);
        assert_eq!(extract_bearer(&headers(b"   ")), None);
    }

    #[test]
    fn non_utf8_header_is_missing() {
        assert_eq!(extract_bearer(&headers(&[0xff, 0xfe])), None);
    }
}
