use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::store::{AuthStore, RoleRecord, UserRecord};

const USER_COLUMNS: &str = "id, first_name, last_name, phone, email, password_hash, status, \
                            two_factor_code, created_at";

pub async fn roles_of(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<RoleRecord>> {
    let roles = sqlx::query_as::<_, RoleRecord>(
        r#"
        SELECT r.id, r.name
        FROM roles r
        JOIN role_user ru ON ru.role_id = r.id
        WHERE ru.user_id = $1
        ORDER BY r.id
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(roles)
}

/// Postgres-backed implementation of the authentication store.
#[derive(Clone)]
pub struct PgAuthStore {
    db: PgPool,
}

impl PgAuthStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthStore for PgAuthStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_two_factor_code(&self, code: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE two_factor_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn set_two_factor_code(&self, id: Uuid, code: Option<&str>) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET two_factor_code = $2 WHERE id = $1")
            .bind(id)
            .bind(code)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $2, two_factor_code = NULL WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn roles_of(&self, id: Uuid) -> anyhow::Result<Vec<RoleRecord>> {
        roles_of(&self.db, id).await
    }
}
