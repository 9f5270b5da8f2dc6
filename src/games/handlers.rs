use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use sqlx::PgPool;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::policy;
use crate::categories::repo::Category;
use crate::developers::repo::Developer;
use crate::games::dto::{CreateGameRequest, GameDetails, UpdateGameRequest};
use crate::games::repo::{self, Game, GameChanges, GameRow, NewGame, GAME_INACTIVE};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::validate::is_valid_name;

/// Public catalog reads, mounted under `/api/auth` like the original routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/games", get(index))
        .route("/games/:id", get(show))
}

/// Admin write operations, mounted under `/api`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/games", post(store))
        .route("/games/:id", put(update))
        .route("/games/deactivate/:id", put(deactivate))
}

async fn with_platforms(db: &PgPool, row: GameRow) -> Result<GameDetails, ApiError> {
    let platforms = repo::platforms_of(db, row.id).await?;
    Ok(GameDetails {
        game: row,
        platforms,
    })
}

async fn check_references(
    db: &PgPool,
    developer_id: Option<Uuid>,
    category_id: Option<Uuid>,
    platform_ids: Option<&[Uuid]>,
) -> Result<(), ApiError> {
    if let Some(id) = developer_id {
        if Developer::find(db, id).await?.is_none() {
            return Err(ApiError::Validation(
                "Developer is required and must exist".into(),
            ));
        }
    }
    if let Some(id) = category_id {
        if Category::find(db, id).await?.is_none() {
            return Err(ApiError::Validation(
                "Category is required and must exist".into(),
            ));
        }
    }
    if let Some(ids) = platform_ids {
        if ids.is_empty() || repo::count_platforms(db, ids).await? != ids.len() as i64 {
            return Err(ApiError::Validation(
                "At least one existing platform is required".into(),
            ));
        }
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<GameDetails>>>, ApiError> {
    let rows = GameRow::list_active(&state.db).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound("No games registered, add one first".into()));
    }

    let mut games = Vec::with_capacity(rows.len());
    for row in rows {
        games.push(with_platforms(&state.db, row).await?);
    }
    Ok(Json(ApiResponse::ok("Game list fetched successfully", games)))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<GameDetails>>, ApiError> {
    let row = GameRow::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Game not found".into()))?;
    let details = with_platforms(&state.db, row).await?;
    Ok(Json(ApiResponse::ok("Game fetched successfully", details)))
}

#[instrument(skip(state, payload))]
pub async fn store(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GameDetails>>), ApiError> {
    policy::require_admin(&state.db, user_id).await?;

    if !is_valid_name(&payload.title) {
        return Err(ApiError::Validation(
            "Title is required and must be 100 characters at most".into(),
        ));
    }
    if payload.description.is_empty() || payload.description.len() > 500 {
        return Err(ApiError::Validation(
            "Description is required and must be 500 characters at most".into(),
        ));
    }
    if Game::find_by_title(&state.db, &payload.title).await?.is_some() {
        return Err(ApiError::Validation(
            "Title is required and must be unique".into(),
        ));
    }
    check_references(
        &state.db,
        Some(payload.developer_id),
        Some(payload.category_id),
        Some(&payload.platform_ids),
    )
    .await?;

    let game = Game::create(
        &state.db,
        NewGame {
            title: &payload.title,
            description: &payload.description,
            last_update: payload.last_update,
            release_date: payload.release_date,
            image: payload.image.as_deref(),
            developer_id: payload.developer_id,
            category_id: payload.category_id,
        },
    )
    .await?;
    repo::set_platforms(&state.db, game.id, &payload.platform_ids).await?;

    info!(game_id = %game.id, "game created");
    let row = GameRow::find(&state.db, game.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Game not found".into()))?;
    let details = with_platforms(&state.db, row).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Game created successfully", details)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<Json<ApiResponse<GameDetails>>, ApiError> {
    policy::require_admin(&state.db, user_id).await?;

    Game::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Game not found".into()))?;

    if let Some(title) = payload.title.as_deref() {
        if !is_valid_name(title) {
            return Err(ApiError::Validation(
                "Title must be 100 characters at most".into(),
            ));
        }
        if let Some(existing) = Game::find_by_title(&state.db, title).await? {
            if existing.id != id {
                return Err(ApiError::Validation("Title must be unique".into()));
            }
        }
    }
    if let Some(description) = payload.description.as_deref() {
        if description.is_empty() || description.len() > 500 {
            return Err(ApiError::Validation(
                "Description must be 500 characters at most".into(),
            ));
        }
    }
    check_references(
        &state.db,
        payload.developer_id,
        payload.category_id,
        payload.platform_ids.as_deref(),
    )
    .await?;

    let game = Game::update(
        &state.db,
        id,
        GameChanges {
            title: payload.title.as_deref(),
            description: payload.description.as_deref(),
            last_update: payload.last_update,
            release_date: payload.release_date,
            image: payload.image.as_deref(),
            developer_id: payload.developer_id,
            category_id: payload.category_id,
        },
    )
    .await?;
    if let Some(platform_ids) = payload.platform_ids.as_deref() {
        repo::set_platforms(&state.db, game.id, platform_ids).await?;
    }

    info!(game_id = %id, "game updated");
    let row = GameRow::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Game not found".into()))?;
    let details = with_platforms(&state.db, row).await?;
    Ok(Json(ApiResponse::ok("Game updated successfully", details)))
}

#[instrument(skip(state))]
pub async fn deactivate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    if !Game::set_status(&state.db, id, GAME_INACTIVE).await? {
        return Err(ApiError::NotFound("Game not found".into()));
    }
    info!(game_id = %id, "game deactivated");
    Ok(Json(ApiResponse::message("Game deactivated successfully")))
}
