use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::store::{RoleRecord, UserRecord, STATUS_ACTIVE};

const USER_COLUMNS: &str = "id, first_name, last_name, phone, email, password_hash, status, \
                            two_factor_code, created_at";

pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: Option<&'a str>,
    pub email: &'a str,
    pub password_hash: &'a str,
}

pub async fn create(db: &PgPool, new_user: NewUser<'_>) -> anyhow::Result<UserRecord> {
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        r#"
        INSERT INTO users (first_name, last_name, phone, email, password_hash, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(new_user.first_name)
    .bind(new_user.last_name)
    .bind(new_user.phone)
    .bind(new_user.email)
    .bind(new_user.password_hash)
    .bind(STATUS_ACTIVE)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn email_taken(
    db: &PgPool,
    email: &str,
    exclude_id: Option<Uuid>,
) -> anyhow::Result<bool> {
    let existing: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2)")
            .bind(email)
            .bind(exclude_id)
            .fetch_optional(db)
            .await?;
    Ok(existing.is_some())
}

pub async fn find_role_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<RoleRecord>> {
    let role = sqlx::query_as::<_, RoleRecord>("SELECT id, name FROM roles WHERE name = $1")
        .bind(name)
        .fetch_optional(db)
        .await?;
    Ok(role)
}

pub async fn attach_role(db: &PgPool, user_id: Uuid, role_id: Uuid) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO role_user (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_id)
    .execute(db)
    .await?;
    Ok(())
}

pub struct ProfileChanges<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

/// Partial update; absent fields keep their stored value.
pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    changes: ProfileChanges<'_>,
) -> anyhow::Result<UserRecord> {
    let user = sqlx::query_as::<_, UserRecord>(&format!(
        r#"
        UPDATE users
        SET first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            phone = COALESCE($4, phone),
            email = COALESCE($5, email),
            password_hash = COALESCE($6, password_hash)
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(changes.first_name)
    .bind(changes.last_name)
    .bind(changes.phone)
    .bind(changes.email)
    .bind(changes.password_hash)
    .fetch_one(db)
    .await?;
    Ok(user)
}

pub async fn set_status(db: &PgPool, id: Uuid, status: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(db)
        .await?;
    Ok(())
}
