use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::policy;
use crate::platforms::dto::PlatformRequest;
use crate::platforms::repo::Platform;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::validate::is_valid_name;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/platforms", post(store).get(index))
        .route("/platforms/:id", get(show))
        .route("/platforms/:id", put(update))
        .route("/platforms/:id", delete(destroy))
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(ApiError::Validation(
            "Name is required, must be unique and 100 characters at most".into(),
        ))
    }
}

#[instrument(skip(state, payload))]
pub async fn store(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<PlatformRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Platform>>), ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    validate_name(&payload.name)?;
    if Platform::find_by_name(&state.db, &payload.name).await?.is_some() {
        return Err(ApiError::Validation(
            "Name is required, must be unique and 100 characters at most".into(),
        ));
    }

    let platform = Platform::create(&state.db, &payload.name).await?;
    info!(platform_id = %platform.id, "platform created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Platform created successfully", platform)),
    ))
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<ApiResponse<Vec<Platform>>>, ApiError> {
    let platforms = Platform::all(&state.db).await?;
    let message = if platforms.is_empty() {
        "No platforms available yet, add one first"
    } else {
        "Platform list fetched successfully"
    };
    Ok(Json(ApiResponse::ok(message, platforms)))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Platform>>, ApiError> {
    let platform = Platform::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Platform not found".into()))?;
    Ok(Json(ApiResponse::ok("Platform fetched successfully", platform)))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PlatformRequest>,
) -> Result<Json<ApiResponse<Platform>>, ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    validate_name(&payload.name)?;
    Platform::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Platform not found".into()))?;
    if let Some(existing) = Platform::find_by_name(&state.db, &payload.name).await? {
        if existing.id != id {
            return Err(ApiError::Validation(
                "Name is required, must be unique and 100 characters at most".into(),
            ));
        }
    }

    let platform = Platform::rename(&state.db, id, &payload.name).await?;
    info!(platform_id = %id, "platform updated");
    Ok(Json(ApiResponse::ok("Platform updated successfully", platform)))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    if !Platform::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Platform not found".into()));
    }
    info!(platform_id = %id, "platform deleted");
    Ok(Json(ApiResponse::message("Platform deleted successfully")))
}
