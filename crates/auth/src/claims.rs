use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenantchat_core::{TenantId, UserId};

use crate::{Role, TokenError};

/// Claims carried by a session token.
///
/// `iat`/`exp` are Unix seconds so standard JWT validators can read them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub tenant_id: TenantId,

    /// Issued-at timestamp.
    pub iat: i64,

    /// Expiration timestamp.
    pub exp: i64,
}

/// Deterministically validate the claim time window.
///
/// Signature checks happen in [`crate::TokenService::verify`]; this only
/// looks at `iat`/`exp` against `now`.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp <= claims.iat {
        return Err(TokenError::InvalidTimeWindow);
    }
    let now = now.timestamp();
    if now < claims.iat {
        return Err(TokenError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn claims_at(now: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            user_id: UserId::new(),
            email: "a@x.com".to_string(),
            role: Role::Member,
            tenant_id: TenantId::new(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(24)).timestamp(),
        }
    }

    #[test]
    fn accepts_inside_window() {
        let now = Utc::now();
        assert_eq!(validate_claims(&claims_at(now), now + Duration::hours(1)), Ok(()));
    }

    #[test]
    fn rejects_at_expiry() {
        let now = Utc::now();
        assert_eq!(
            validate_claims(&claims_at(now), now + Duration::hours(24)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn rejects_future_issue() {
        let now = Utc::now();
        assert_eq!(
            validate_claims(&claims_at(now), now - Duration::minutes(5)),
            Err(TokenError::NotYetValid)
        );
    }

    #[test]
    fn rejects_inverted_window() {
        let now = Utc::now();
        let mut claims = claims_at(now);
        claims.exp = claims.iat;
        assert_eq!(validate_claims(&claims, now), Err(TokenError::InvalidTimeWindow));
    }
}
