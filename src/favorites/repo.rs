use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::games::repo::Game;

#[derive(Debug, FromRow)]
struct FavoriteRow {
    favorited_at: OffsetDateTime,
    #[sqlx(flatten)]
    game: Game,
}

pub async fn list_with_games(
    db: &PgPool,
    user_id: Uuid,
) -> anyhow::Result<Vec<(Game, OffsetDateTime)>> {
    let rows = sqlx::query_as::<_, FavoriteRow>(
        r#"
        SELECT fg.created_at AS favorited_at,
               g.id, g.title, g.description, g.last_update, g.release_date, g.status,
               g.image, g.developer_id, g.category_id, g.created_at
        FROM favorite_games fg
        JOIN games g ON g.id = fg.game_id
        WHERE fg.user_id = $1
        ORDER BY fg.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(|r| (r.game, r.favorited_at)).collect())
}

pub async fn exists(db: &PgPool, user_id: Uuid, game_id: Uuid) -> anyhow::Result<bool> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        "SELECT game_id FROM favorite_games WHERE user_id = $1 AND game_id = $2",
    )
    .bind(user_id)
    .bind(game_id)
    .fetch_optional(db)
    .await?;
    Ok(row.is_some())
}

pub async fn add(db: &PgPool, user_id: Uuid, game_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO favorite_games (user_id, game_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(game_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove(db: &PgPool, user_id: Uuid, game_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM favorite_games WHERE user_id = $1 AND game_id = $2")
        .bind(user_id)
        .bind(game_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
