use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_INACTIVE: &str = "inactive";

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_VISITOR: &str = "visitor";

/// User record as persisted. The password hash and the pending verification
/// code never leave the server in JSON.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: String,
    /// Single outstanding 6-digit verification code, shared by the login-2FA
    /// and password-reset flows. Issuing a new code overwrites it.
    #[serde(skip_serializing)]
    pub two_factor_code: Option<String>,
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRecord {
    pub id: Uuid,
    pub name: String,
}

/// Persistence seam for the authentication flows. All 2FA state crosses
/// through the user row; the core keeps nothing in-process between calls.
#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>>;
    async fn find_by_two_factor_code(&self, code: &str) -> anyhow::Result<Option<UserRecord>>;
    /// Single atomic write: `None` clears the code, `Some` overwrites it
    /// unconditionally.
    async fn set_two_factor_code(&self, id: Uuid, code: Option<&str>) -> anyhow::Result<()>;
    /// Stores a new password hash and clears the verification code in the
    /// same statement.
    async fn reset_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
    /// Roles ordered by lowest role id first, so "the user's role" is stable.
    async fn roles_of(&self, id: Uuid) -> anyhow::Result<Vec<RoleRecord>>;
}

#[cfg(test)]
pub mod memory {
    //! In-memory store used by the flow tests; mirrors the row-level
    //! atomicity the database gives the real store.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryAuthStore {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        users: Vec<UserRecord>,
        roles: HashMap<Uuid, Vec<RoleRecord>>,
    }

    impl MemoryAuthStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert_user(&self, user: UserRecord, roles: Vec<RoleRecord>) {
            let mut inner = self.inner.lock().unwrap();
            inner.roles.insert(user.id, roles);
            inner.users.push(user);
        }

        pub fn user(&self, id: Uuid) -> Option<UserRecord> {
            let inner = self.inner.lock().unwrap();
            inner.users.iter().find(|u| u.id == id).cloned()
        }

        pub fn code_of(&self, id: Uuid) -> Option<String> {
            self.user(id).and_then(|u| u.two_factor_code)
        }
    }

    #[async_trait]
    impl AuthStore for MemoryAuthStore {
        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.users.iter().find(|u| u.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
            Ok(self.user(id))
        }

        async fn find_by_two_factor_code(&self, code: &str) -> anyhow::Result<Option<UserRecord>> {
            let inner = self.inner.lock().unwrap();
            Ok(inner
                .users
                .iter()
                .find(|u| u.two_factor_code.as_deref() == Some(code))
                .cloned())
        }

        async fn set_two_factor_code(&self, id: Uuid, code: Option<&str>) -> anyhow::Result<()> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
                user.two_factor_code = code.map(str::to_owned);
            }
            Ok(())
        }

        async fn reset_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
            let mut inner = self.inner.lock().unwrap();
            if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
                user.password_hash = password_hash.to_owned();
                user.two_factor_code = None;
            }
            Ok(())
        }

        async fn roles_of(&self, id: Uuid) -> anyhow::Result<Vec<RoleRecord>> {
            let inner = self.inner.lock().unwrap();
            let mut roles = inner.roles.get(&id).cloned().unwrap_or_default();
            roles.sort_by_key(|r| r.id);
            Ok(roles)
        }
    }
}
