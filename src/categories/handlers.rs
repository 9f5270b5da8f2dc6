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
use crate::categories::dto::CategoryRequest;
use crate::categories::repo::Category;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::validate::is_valid_name;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(store).get(index))
        .route("/categories/:id", get(show))
        .route("/categories/:id", put(update))
        .route("/categories/:id", delete(destroy))
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
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    validate_name(&payload.name)?;
    if Category::find_by_name(&state.db, &payload.name).await?.is_some() {
        return Err(ApiError::Validation(
            "Name is required, must be unique and 100 characters at most".into(),
        ));
    }

    let category = Category::create(&state.db, &payload.name).await?;
    info!(category_id = %category.id, "category created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Category created successfully", category)),
    ))
}

#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = Category::all(&state.db).await?;
    let message = if categories.is_empty() {
        "No categories available yet, add one first"
    } else {
        "Category list fetched successfully"
    };
    Ok(Json(ApiResponse::ok(message, categories)))
}

#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = Category::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    Ok(Json(ApiResponse::ok("Category fetched successfully", category)))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    validate_name(&payload.name)?;
    Category::find(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".into()))?;
    if let Some(existing) = Category::find_by_name(&state.db, &payload.name).await? {
        if existing.id != id {
            return Err(ApiError::Validation(
                "Name is required, must be unique and 100 characters at most".into(),
            ));
        }
    }

    let category = Category::rename(&state.db, id, &payload.name).await?;
    info!(category_id = %id, "category updated");
    Ok(Json(ApiResponse::ok("Category updated successfully", category)))
}

#[instrument(skip(state))]
pub async fn destroy(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    policy::require_admin(&state.db, user_id).await?;
    if !Category::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Category not found".into()));
    }
    info!(category_id = %id, "category deleted");
    Ok(Json(ApiResponse::message("Category deleted successfully")))
}
