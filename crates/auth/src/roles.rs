use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role granted to a user within its tenant.
///
/// Closed set. Serde uses the canonical uppercase names only, so a token
/// carrying `"admin"` or `"OWNER"` fails to decode rather than matching
/// anything. There is no ordering between roles; see [`crate::require_role`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Moderator,
    Member,
    Guest,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Moderator, Role::Member, Role::Guest];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Moderator => "MODERATOR",
            Role::Member => "MEMBER",
            Role::Guest => "GUEST",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid role '{0}': must be ADMIN, MODERATOR, MEMBER, or GUEST")]
pub struct UnknownRole(pub String);

/// Parses request input. Case-insensitive: `"member"` becomes `Role::Member`.
impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == upper)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
