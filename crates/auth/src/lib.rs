//! `tenantchat-auth` — session tokens, password hashing and role policy.
//!
//! This crate is decoupled from HTTP and storage: the API layer feeds it
//! header values and user records, and it answers with claims or denials.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AuthzError, ensure_tenant, require_role};
pub use claims::{SessionClaims, validate_claims};
pub use password::{PasswordError, hash_password, verify_password};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use token::{SESSION_TTL_HOURS, TokenError, TokenService, TokenVerifier};
pub use user::{NewUser, User, UserDraft, UserPatch, normalize_email};
