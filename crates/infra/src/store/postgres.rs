//! Postgres-backed credential store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation on `tenants.name`) | `23505` | `DuplicateTenant` |
//! | Database (other unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Other | N/A | `Backend` |
//!
//! Tenant isolation is enforced in SQL: every user query carries
//! `tenant_id` in its WHERE clause.

use std::sync::Arc;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;

use tenantchat_auth::{Role, User, UserDraft, UserPatch};
use tenantchat_channels::Channel;
use tenantchat_core::{ChannelId, Tenant, TenantId, UserId};

use super::{CredentialStore, Registration, StoreError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS tenants (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        tenant_id UUID NOT NULL,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('ADMIN', 'MODERATOR', 'MEMBER', 'GUEST'))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS users_tenant_idx ON users (tenant_id)",
    r#"
    CREATE TABLE IF NOT EXISTS channels (
        id UUID PRIMARY KEY,
        stream_id TEXT NOT NULL UNIQUE,
        tenant_id UUID NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        created_by UUID NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS channels_tenant_idx ON channels (tenant_id)",
];

const USER_COLUMNS: &str = "id, tenant_id, email, name, password_hash, role";
const CHANNEL_COLUMNS: &str = "id, stream_id, tenant_id, name, description, created_by";

#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: Arc<PgPool>,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Create tables and indexes if missing. Safe to run on every start.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    async fn insert_tenant<'e, E>(executor: E, tenant: &Tenant) -> Result<(), StoreError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO tenants (id, name) VALUES ($1, $2)")
            .bind(tenant.id.as_uuid())
            .bind(&tenant.name)
            .execute(executor)
            .await
            .map_err(|e| map_sqlx_error("insert_tenant", e).for_tenant(&tenant.name))?;
        Ok(())
    }

    async fn insert_user<'e, E>(executor: E, user: &User) -> Result<(), StoreError>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, name, password_hash, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(user.tenant_id.as_uuid())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(executor)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CredentialStore for PostgresCredentialStore {
    #[instrument(skip(self, tenant), fields(tenant_id = %tenant.id), err)]
    async fn create_tenant(&self, tenant: Tenant) -> Result<Tenant, StoreError> {
        Self::insert_tenant(&*self.pool, &tenant).await?;
        Ok(tenant)
    }

    #[instrument(skip(self), err)]
    async fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let rows = sqlx::query("SELECT id, name FROM tenants ORDER BY name ASC")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_tenants", e))?;
        rows.iter().map(tenant_from_row).collect()
    }

    #[instrument(skip(self, tenant, user), fields(user_id = %user.id), err)]
    async fn register(&self, tenant: Tenant, user: UserDraft) -> Result<Registration, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("register", e))?;

        Self::insert_tenant(&mut *tx, &tenant).await?;

        let user = user.into_user(tenant.id);
        // Dropping `tx` on error rolls back the tenant insert as well.
        Self::insert_user(&mut *tx, &user).await?;

        tx.commit().await.map_err(|e| map_sqlx_error("register", e))?;

        Ok(Registration { tenant, user })
    }

    #[instrument(skip(self, user), fields(tenant_id = %user.tenant_id, user_id = %user.id), err)]
    async fn create_user(&self, user: User) -> Result<User, StoreError> {
        Self::insert_user(&*self.pool, &user).await?;
        Ok(user)
    }

    #[instrument(skip(self, email), err)]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %user_id), err)]
    async fn get_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(user_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_users(&self, tenant_id: TenantId) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = $1 ORDER BY email ASC"
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, patch), fields(tenant_id = %tenant_id, user_id = %user_id), err)]
    async fn update_user(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        patch: &UserPatch,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($3, name),
                email = COALESCE($4, email),
                role = COALESCE($5, role)
            WHERE id = $1 AND tenant_id = $2
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user_id.as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(patch.name.as_deref())
        .bind(patch.email.as_deref())
        .bind(patch.role.map(|r| r.as_str()))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, user_id = %user_id), err)]
    async fn delete_user(&self, tenant_id: TenantId, user_id: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(user_id.as_uuid())
            .bind(tenant_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, channel), fields(tenant_id = %channel.tenant_id, stream_id = %channel.stream_id), err)]
    async fn create_channel(&self, channel: Channel) -> Result<Channel, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO channels (id, stream_id, tenant_id, name, description, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(channel.id.as_uuid())
        .bind(&channel.stream_id)
        .bind(channel.tenant_id.as_uuid())
        .bind(&channel.name)
        .bind(&channel.description)
        .bind(channel.created_by.as_uuid())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_channel", e))?;
        Ok(channel)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn list_channels(&self, tenant_id: TenantId) -> Result<Vec<Channel>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CHANNEL_COLUMNS} FROM channels WHERE tenant_id = $1 ORDER BY name ASC"
        ))
        .bind(tenant_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_channels", e))?;
        rows.iter().map(channel_from_row).collect()
    }

    #[instrument(skip(self), fields(channel_id = %channel_id), err)]
    async fn find_channel(&self, channel_id: ChannelId) -> Result<Option<Channel>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CHANNEL_COLUMNS} FROM channels WHERE id = $1"))
            .bind(channel_id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_channel", e))?;
        row.as_ref().map(channel_from_row).transpose()
    }
}

fn tenant_from_row(row: &PgRow) -> Result<Tenant, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode tenant row: {e}"));
    Ok(Tenant {
        id: TenantId::from_uuid(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode user row: {e}"));
    let role: String = row.try_get("role").map_err(decode)?;
    let role: Role = role
        .parse()
        .map_err(|e| StoreError::Backend(format!("stored user has {e}")))?;
    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(decode)?),
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(decode)?),
        email: row.try_get("email").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        role,
    })
}

fn channel_from_row(row: &PgRow) -> Result<Channel, StoreError> {
    let decode = |e: sqlx::Error| StoreError::Backend(format!("failed to decode channel row: {e}"));
    Ok(Channel {
        id: ChannelId::from_uuid(row.try_get("id").map_err(decode)?),
        stream_id: row.try_get("stream_id").map_err(decode)?,
        tenant_id: TenantId::from_uuid(row.try_get("tenant_id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        created_by: UserId::from_uuid(row.try_get("created_by").map_err(decode)?),
    })
}

/// Unique constraint Postgres generates for `tenants.name`.
const TENANT_NAME_CONSTRAINT: &str = "tenants_name_key";

impl StoreError {
    /// Attach the tenant name to a tenant-name uniqueness failure.
    fn for_tenant(self, name: &str) -> Self {
        match self {
            StoreError::DuplicateTenant(_) => StoreError::DuplicateTenant(name.to_string()),
            other => other,
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match (db_err.code().as_deref(), db_err.constraint()) {
                (Some("23505"), Some(TENANT_NAME_CONSTRAINT)) => StoreError::DuplicateTenant(msg),
                (Some("23505"), _) => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
