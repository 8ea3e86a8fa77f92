use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tenantchat_auth::{User, UserDraft, UserPatch};
use tenantchat_channels::Channel;
use tenantchat_core::{ChannelId, Tenant, TenantId, TenantScoped, UserId};

use super::{CredentialStore, Registration, StoreError};

#[derive(Debug, Default)]
struct State {
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<UserId, User>,
    channels: HashMap<ChannelId, Channel>,
}

impl State {
    fn tenant_named(&self, name: &str) -> Option<&Tenant> {
        self.tenants.values().find(|t| t.name == name)
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// In-memory credential store for tests/dev.
///
/// One lock guards all three tables, so multi-row writes (`register`) are
/// atomic and uniqueness checks cannot race with inserts.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<State>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn create_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError> {
        let mut state = self.write()?;
        if state.tenant_named(&tenant.name).is_some() {
            return Err(StoreError::DuplicateTenant(tenant.name));
        }
        state.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let state = self.read()?;
        let mut tenants: Vec<Tenant> = state.tenants.values().cloned().collect();
        tenants.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tenants)
    }

    async fn register(&self, tenant: Tenant, user: UserDraft) -> Result<Registration, StoreError> {
        let mut state = self.write()?;

        // Same order as the Postgres transaction: tenant first, then user.
        // Both checks run before either insert.
        if state.tenant_named(&tenant.name).is_some() {
            return Err(StoreError::DuplicateTenant(tenant.name));
        }
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!("email '{}' already registered", user.email)));
        }

        state.tenants.insert(tenant.id, tenant.clone());
        let user = user.into_user(tenant.id);
        state.users.insert(user.id, user.clone());

        Ok(Registration { tenant, user })
    }

    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        let mut state = self.write()?;
        if state.email_taken(&user.email, None) {
            return Err(StoreError::Conflict(format!("email '{}' already registered", user.email)));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.read()?;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<Option<User>, StoreError> {
        let state = self.read()?;
        Ok(state
            .users
            .get(&user_id)
            .filter(|u| u.belongs_to(tenant_id))
            .cloned())
    }

    async fn list_users(&self, tenant_id: TenantId) -> Result<Vec<User>, StoreError> {
        let state = self.read()?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.belongs_to(tenant_id))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn update_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, StoreError> {
        let mut state = self.write()?;

        if let Some(email) = &patch.email {
            if state.email_taken(email, Some(user_id)) {
                return Err(StoreError::Conflict(format!("email '{email}' already registered")));
            }
        }

        let Some(user) = state.users.get_mut(&user_id).filter(|u| u.belongs_to(tenant_id)) else {
            return Ok(None);
        };
        patch.apply(user);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let owned = state
            .users
            .get(&user_id)
            .is_some_and(|u| u.belongs_to(tenant_id));
        if owned {
            state.users.remove(&user_id);
        }
        Ok(owned)
    }

    async fn create_channel(&self, channel: Channel) -> Result<Channel, StoreError> {
        let mut state = self.write()?;
        if state.channels.values().any(|c| c.stream_id == channel.stream_id) {
            return Err(StoreError::Conflict(format!(
                "channel '{}' already recorded",
                channel.stream_id
            )));
        }
        state.channels.insert(channel.id, channel.clone());
        Ok(channel)
    }

    async fn list_channels(&self, tenant_id: TenantId) -> Result<Vec<Channel>, StoreError> {
        let state = self.read()?;
        let mut channels: Vec<Channel> = state
            .channels
            .values()
            .filter(|c| c.belongs_to(tenant_id))
            .cloned()
            .collect();
        channels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(channels)
    }

    async fn find_channel(&self, channel_id: ChannelId) -> Result<Option<Channel>, StoreError> {
        let state = self.read()?;
        Ok(state.channels.get(&channel_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantchat_auth::Role;
    use tenantchat_channels::NewChannel;

    fn draft(email: &str, role: Role) -> UserDraft {
        UserDraft {
            id: UserId::new(),
            email: email.to_string(),
            name: "Someone".to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            role,
        }
    }

    fn tenant(name: &str) -> Tenant {
        Tenant::new(name).unwrap()
    }

    #[tokio::test]
    async fn register_creates_tenant_with_first_user() {
        let store = InMemoryCredentialStore::new();

        let registration = store.register(tenant("Acme"), draft("a@acme.io", Role::Admin)).await.unwrap();
        assert_eq!(registration.user.tenant_id, registration.tenant.id);
        assert_eq!(store.list_tenants().await.unwrap(), vec![registration.tenant]);
    }

    #[tokio::test]
    async fn register_into_taken_tenant_name_writes_nothing() {
        let store = InMemoryCredentialStore::new();
        let acme = store.register(tenant("Acme"), draft("a@acme.io", Role::Admin)).await.unwrap();

        let err = store
            .register(tenant("Acme"), draft("eve@evil.io", Role::Admin))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateTenant("Acme".to_string()));

        assert!(store.find_user_by_email("eve@evil.io").await.unwrap().is_none());
        assert_eq!(store.list_users(acme.tenant.id).await.unwrap().len(), 1);
        assert_eq!(store.list_tenants().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_registration_leaves_no_tenant() {
        let store = InMemoryCredentialStore::new();
        store.register(tenant("Acme"), draft("a@acme.io", Role::Admin)).await.unwrap();

        let err = store
            .register(tenant("Globex"), draft("a@acme.io", Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let names: Vec<String> = store.list_tenants().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Acme".to_string()]);
    }

    #[tokio::test]
    async fn duplicate_tenant_name_conflicts() {
        let store = InMemoryCredentialStore::new();
        store.create_tenant(tenant("Acme")).await.unwrap();
        let err = store.create_tenant(tenant("Acme")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTenant(_)));
    }

    #[tokio::test]
    async fn user_reads_and_writes_are_tenant_scoped() {
        let store = InMemoryCredentialStore::new();
        let acme = store.register(tenant("Acme"), draft("a@acme.io", Role::Admin)).await.unwrap();
        let globex = store.register(tenant("Globex"), draft("g@globex.io", Role::Admin)).await.unwrap();

        let foreign = globex.user.id;
        assert!(store.get_user(acme.tenant.id, foreign).await.unwrap().is_none());

        let patch = UserPatch::new(Some("Hijacked"), None, None).unwrap();
        assert!(store.update_user(acme.tenant.id, foreign, &patch).await.unwrap().is_none());
        assert!(!store.delete_user(acme.tenant.id, foreign).await.unwrap());

        let still_there = store.get_user(globex.tenant.id, foreign).await.unwrap().unwrap();
        assert_eq!(still_there.name, "Someone");

        let listed = store.list_users(acme.tenant.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].email, "a@acme.io");
    }

    #[tokio::test]
    async fn update_rejects_email_owned_by_someone_else() {
        let store = InMemoryCredentialStore::new();
        let a = store.register(tenant("Acme"), draft("a@acme.io", Role::Admin)).await.unwrap();
        let b = draft("b@acme.io", Role::Member).into_user(a.tenant.id);
        store.create_user(b).await.unwrap();

        let patch = UserPatch::new(None, Some("b@acme.io"), None).unwrap();
        let err = store.update_user(a.tenant.id, a.user.id, &patch).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Re-submitting your own email is not a conflict.
        let patch = UserPatch::new(None, Some("a@acme.io"), Some(Role::Moderator)).unwrap();
        let updated = store.update_user(a.tenant.id, a.user.id, &patch).await.unwrap().unwrap();
        assert_eq!(updated.role, Role::Moderator);
    }

    #[tokio::test]
    async fn channels_list_per_tenant_and_stream_ids_are_unique() {
        let store = InMemoryCredentialStore::new();
        let acme = store.register(tenant("Acme"), draft("a@acme.io", Role::Admin)).await.unwrap();
        let globex = store.register(tenant("Globex"), draft("g@globex.io", Role::Admin)).await.unwrap();

        let new = NewChannel::new("general", None, acme.tenant.id, acme.user.id).unwrap();
        let stream_id = new.provider_channel_id();
        let channel = store.create_channel(new.clone().into_channel(stream_id.clone())).await.unwrap();

        let dup = store.create_channel(new.into_channel(stream_id)).await.unwrap_err();
        assert!(matches!(dup, StoreError::Conflict(_)));

        assert_eq!(store.list_channels(acme.tenant.id).await.unwrap().len(), 1);
        assert!(store.list_channels(globex.tenant.id).await.unwrap().is_empty());
        assert_eq!(store.find_channel(channel.id).await.unwrap(), Some(channel));
    }
}
