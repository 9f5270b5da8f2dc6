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
use crate::developers::dto::DeveloperRequest;
use crate::developers::repo::Developer;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::validate::is_valid_name;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/developers", post(store).get(index))
        .route("/developers/:id", get(show))
        .route("/developers/:id", put(update))
        .route("/developers/:id", delete(destroy))
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
    Json(payload): Json<DeveloperRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Developer>>), ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    validate_name(&payload.name)?;
    if Developer::find_by_name(&state.db, &payload.name).await?.is_some() {
        return Err(ApiError::Validation(
            "Name is required, must be unique and 100 characters at most".into(),
        ));
    }

    let developer = Developer::create(&state.db, &payload.name).await?;
    info!(developer_id = %developer.id, "developer created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Developer created successfully", developer)),
    ))
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<ApiResponse<Vec<Developer>>>, ApiError> {
    let developers = Developer::all(&state.db).await?;
    let message = if developers.is_empty() {
        "No developers available yet, add one first"
    } else {
        "Developer list fetched successfully"
    };
    Ok(Json(ApiResponse::ok(message, developers)))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Developer>>, ApiError> {
    let developer = Developer::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Developer not found".into()))?;
    Ok(Json(ApiResponse::ok("Developer fetched successfully", developer)))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeveloperRequest>,
) -> Result<Json<ApiResponse<Developer>>, ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    validate_name(&payload.name)?;
    Developer::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Developer not found".into()))?;
    if let Some(existing) = Developer::find_by_name(&state.db, &payload.name).await? {
        if existing.id != id {
            return Err(ApiError::Validation(
                "Name is required, must be unique and 100 characters at most".into(),
            ));
        }
    }

    let developer = Developer::rename(&state.db, id, &payload.name).await?;
    info!(developer_id = %id, "developer updated");
    Ok(Json(ApiResponse::ok("Developer updated successfully", developer)))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    if !Developer::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Developer not found".into()));
    }
    info!(developer_id = %id, "developer deleted");
    Ok(Json(ApiResponse::message("Developer deleted successfully")))
}
