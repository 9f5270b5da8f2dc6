use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::platforms::repo::Platform;

pub const GAME_ACTIVE: &str = "active";
pub const GAME_INACTIVE: &str = "inactive";

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "date_format")]
    pub last_update: Date,
    #[serde(with = "date_format")]
    pub release_date: Date,
    pub status: String,
    pub image: Option<String>,
    pub developer_id: Uuid,
    pub category_id: Uuid,
    #[serde(skip_serializing)]
    pub created_at: OffsetDateTime,
}

/// Game joined with its developer and category names.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GameRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[serde(with = "date_format")]
    pub last_update: Date,
    #[serde(with = "date_format")]
    pub release_date: Date,
    pub status: String,
    pub image: Option<String>,
    pub developer_id: Uuid,
    pub category_id: Uuid,
    pub developer: String,
    pub category: String,
}

const GAME_COLUMNS: &str =
    "id, title, description, last_update, release_date, status, image, developer_id, \
     category_id, created_at";

const ROW_SELECT: &str = r#"
    SELECT g.id, g.title, g.description, g.last_update, g.release_date, g.status, g.image,
           g.developer_id, g.category_id, d.name AS developer, c.name AS category
    FROM games g
    JOIN developers d ON d.id = g.developer_id
    JOIN categories c ON c.id = g.category_id
"#;

pub struct NewGame<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub last_update: Date,
    pub release_date: Date,
    pub image: Option<&'a str>,
    pub developer_id: Uuid,
    pub category_id: Uuid,
}

pub struct GameChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub last_update: Option<Date>,
    pub release_date: Option<Date>,
    pub image: Option<&'a str>,
    pub developer_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl Game {
    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Game>> {
        let row =
            sqlx::query_as::<_, Game>(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(row)
    }

    pub async fn find_by_title(db: &PgPool, title: &str) -> anyhow::Result<Option<Game>> {
        let row = sqlx::query_as::<_, Game>(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(db)
        .await?;
        Ok(row)
    }

    pub async fn create(db: &PgPool, new_game: NewGame<'_>) -> anyhow::Result<Game> {
        let row = sqlx::query_as::<_, Game>(&format!(
            r#"
            INSERT INTO games
                (title, description, last_update, release_date, status, image,
                 developer_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {GAME_COLUMNS}
            "#
        ))
        .bind(new_game.title)
        .bind(new_game.description)
        .bind(new_game.last_update)
        .bind(new_game.release_date)
        .bind(GAME_ACTIVE)
        .bind(new_game.image)
        .bind(new_game.developer_id)
        .bind(new_game.category_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn update(db: &PgPool, id: Uuid, changes: GameChanges<'_>) -> anyhow::Result<Game> {
        let row = sqlx::query_as::<_, Game>(&format!(
            r#"
            UPDATE games
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                last_update = COALESCE($4, last_update),
                release_date = COALESCE($5, release_date),
                image = COALESCE($6, image),
                developer_id = COALESCE($7, developer_id),
                category_id = COALESCE($8, category_id)
            WHERE id = $1
            RETURNING {GAME_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.last_update)
        .bind(changes.release_date)
        .bind(changes.image)
        .bind(changes.developer_id)
        .bind(changes.category_id)
        .fetch_one(db)
        .await?;
        Ok(row)
    }

    pub async fn set_status(db: &PgPool, id: Uuid, status: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE games SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl GameRow {
    pub async fn list_active(db: &PgPool) -> anyhow::Result<Vec<GameRow>> {
        let rows = sqlx::query_as::<_, GameRow>(&format!(
            "{ROW_SELECT} WHERE g.status = $1 ORDER BY g.title ASC"
        ))
        .bind(GAME_ACTIVE)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<GameRow>> {
        let row = sqlx::query_as::<_, GameRow>(&format!("{ROW_SELECT} WHERE g.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(row)
    }
}

pub async fn platforms_of(db: &PgPool, game_id: Uuid) -> anyhow::Result<Vec<Platform>> {
    let rows = sqlx::query_as::<_, Platform>(
        r#"
        SELECT p.id, p.name, p.created_at
        FROM platforms p
        JOIN game_platform gp ON gp.platform_id = p.id
        WHERE gp.game_id = $1
        ORDER BY p.name ASC
        "#,
    )
    .bind(game_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn count_platforms(db: &PgPool, platform_ids: &[Uuid]) -> anyhow::Result<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM platforms WHERE id = ANY($1)")
            .bind(platform_ids)
            .fetch_one(db)
            .await?;
    Ok(count)
}

/// Replaces the platform set for a game.
pub async fn set_platforms(db: &PgPool, game_id: Uuid, platform_ids: &[Uuid]) -> anyhow::Result<()> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM game_platform WHERE game_id = $1")
        .bind(game_id)
        .execute(&mut *tx)
        .await?;
    for platform_id in platform_ids {
        sqlx::query(
            "INSERT INTO game_platform (game_id, platform_id, status) VALUES ($1, $2, 'active')",
        )
        .bind(game_id)
        .bind(platform_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(())
}
