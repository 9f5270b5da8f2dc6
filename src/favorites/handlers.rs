use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::favorites::dto::{AddFavoriteRequest, FavoriteDetails};
use crate::favorites::repo;
use crate::games::repo::Game;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/favorites", get(index).post(add))
        .route("/favorites/:game_id", delete(remove))
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ApiResponse<Vec<FavoriteDetails>>>, ApiError> {
    let favorites = repo::list_with_games(&state.db, user_id)
        .await
        .map_err(ApiError::Internal)?
        .into_iter()
        .map(|(game, favorited_at)| FavoriteDetails { game, favorited_at })
        .collect();
    Ok(Json(ApiResponse::ok("Favorites fetched successfully", favorites)))
}

#[instrument(skip(state, payload))]
pub async fn add(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    if Game::find(&state.db, payload.game_id).await?.is_none() {
        return Err(ApiError::NotFound("Game does not exist".into()));
    }
    if repo::exists(&state.db, user_id, payload.game_id).await? {
        return Err(ApiError::Conflict("Game is already in favorites".into()));
    }

    repo::add(&state.db, user_id, payload.game_id).await?;
    info!(user_id = %user_id, game_id = %payload.game_id, "favorite added");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::message("Game added to favorites")),
    ))
}

#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(game_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !repo::remove(&state.db, user_id, game_id).await? {
        return Err(ApiError::NotFound("Game is not in favorites".into()));
    }
    info!(user_id = %user_id, game_id = %game_id, "favorite removed");
    Ok(Json(ApiResponse::message("Game removed from favorites")))
}
