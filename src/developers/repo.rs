use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Developer {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
}

impl Developer {
    pub async fn all(db: &PgPool) -> anyhow::Result<Vec<Developer>> {
        let rows = sqlx::query_as::<_, Developer>(
            "SELECT id, name, created_at FROM developers ORDER BY name ASC",
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Developer>> {
        let row = sqlx::query_as::<_, Developer>(
            "SELECT id, name, created_at FROM developers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn find_by_name(db: &PgPool, name: &str) -> anyhow::Result<Option<Developer>> {
        let row = sqlx::query_as::<_, Developer>(
            "SELECT id, name, created_at FROM developers WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(db: &PgPool, name: &str) -> anyhow::Result<Developer> {
        let row = sqlx::query_as::<_, Developer>(
            "INSERT INTO developers (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn rename(db: &PgPool, id: Uuid, name: &str) -> anyhow::Result<Developer> {
        let row = sqlx::query_as::<_, Developer>(
            "UPDATE developers SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM developers WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
