//! User records and their validated inputs.
//!
//! A user belongs to exactly one tenant for its lifetime: nothing here can
//! change `tenant_id` after [`UserDraft::into_user`].

use serde::Serialize;

use tenantchat_core::error::require_non_empty;
use tenantchat_core::{DomainError, DomainResult, Entity, TenantId, TenantScoped, UserId};

use crate::{PasswordError, Role, hash_password, verify_password};

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
}

impl User {
    pub fn check_password(&self, password: &str) -> Result<bool, PasswordError> {
        verify_password(password, &self.password_hash)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl TenantScoped for User {
    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// Lowercase and sanity-check an email address.
pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = require_non_empty("email", email)?.to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation(format!("invalid email '{email}'")));
    }
    Ok(email)
}

/// Validated input for a new user (registration or admin create).
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    password: String,
    pub role: Role,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

impl NewUser {
    pub fn new(email: &str, name: &str, password: &str, role: Role) -> DomainResult<Self> {
        if password.is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        Ok(Self {
            email: normalize_email(email)?,
            name: require_non_empty("name", name)?,
            password: password.to_string(),
            role,
        })
    }

    /// Hash the password and assign an id. The tenant is bound later.
    pub fn hash(self) -> Result<UserDraft, PasswordError> {
        Ok(UserDraft {
            id: UserId::new(),
            password_hash: hash_password(&self.password)?,
            email: self.email,
            name: self.name,
            role: self.role,
        })
    }
}

/// A hashed user that has not yet been bound to a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: Role,
}

impl UserDraft {
    pub fn into_user(self, tenant_id: TenantId) -> User {
        User {
            id: self.id,
            tenant_id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            role: self.role,
        }
    }
}

/// Partial update. Only name, email and role are mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn new(name: Option<&str>, email: Option<&str>, role: Option<Role>) -> DomainResult<Self> {
        Ok(Self {
            name: name.map(|n| require_non_empty("name", n)).transpose()?,
            email: email.map(normalize_email).transpose()?,
            role,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_email() {
        let user = NewUser::new(" Ann@X.com ", "Ann", "pw", Role::Admin).unwrap();
        assert_eq!(user.email, "ann@x.com");
    }

    #[test]
    fn new_user_rejects_bad_input() {
        assert!(NewUser::new("no-at-sign", "Ann", "pw", Role::Admin).is_err());
        assert!(NewUser::new("a@x.com", " ", "pw", Role::Admin).is_err());
        assert!(NewUser::new("a@x.com", "Ann", "", Role::Admin).is_err());
        assert!(NewUser::new("a@b@x.com", "Ann", "pw", Role::Admin).is_err());
    }

    #[test]
    fn debug_hides_password() {
        let user = NewUser::new("a@x.com", "Ann", "hunter2", Role::Guest).unwrap();
        assert!(!format!("{user:?}").contains("hunter2"));
    }

    #[test]
    fn hashed_draft_keeps_tenant_binding() {
        let draft = NewUser::new("a@x.com", "Ann", "pw", Role::Member)
            .unwrap()
            .hash()
            .unwrap();
        let tenant = TenantId::new();
        let user = draft.into_user(tenant);

        assert_eq!(user.tenant_id, tenant);
        assert!(user.check_password("pw").unwrap());
    }

    #[test]
    fn serialized_user_omits_password_hash() {
        let draft = NewUser::new("a@x.com", "Ann", "pw", Role::Member)
            .unwrap()
            .hash()
            .unwrap();
        let json = serde_json::to_value(draft.into_user(TenantId::new())).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "MEMBER");
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut user = NewUser::new("a@x.com", "Ann", "pw", Role::Member)
            .unwrap()
            .hash()
            .unwrap()
            .into_user(TenantId::new());
        let tenant = user.tenant_id;

        UserPatch::new(None, Some("B@x.com"), Some(Role::Moderator))
            .unwrap()
            .apply(&mut user);

        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "b@x.com");
        assert_eq!(user.role, Role::Moderator);
        assert_eq!(user.tenant_id, tenant);
    }
}
