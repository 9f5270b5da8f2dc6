use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::policy;
use crate::auth::repo::{self as auth_repo, PgAuthStore};
use crate::auth::service;
use crate::auth::store::{AuthStore, UserRecord, ROLE_ADMIN, ROLE_VISITOR, STATUS_INACTIVE};
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::users::dto::{
    CreatedUserData, ProfileResponse, RegisterAdminRequest, RegisterVisitRequest,
    UpdateProfileRequest,
};
use crate::users::repo::{self, NewUser, ProfileChanges};
use crate::validate::{is_valid_email, is_valid_name, is_valid_password, is_valid_phone};

/// Registration endpoints, mounted under `/api/auth`.
pub fn register_routes() -> Router<AppState> {
    Router::new()
        .route("/registerAdmin", post(register_admin))
        .route("/registerVisit", post(register_visit))
}

/// Profile endpoints for authenticated users, mounted under `/api`.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/my-profile", get(my_profile))
        .route("/users/update-profile/:id", put(update_profile))
        .route("/users/sofdelete-account/:id", put(deactivate_account))
}

struct NewAccount {
    first_name: String,
    last_name: String,
    phone: Option<String>,
    email: String,
    password: String,
}

fn validate_new_account(account: &NewAccount) -> Result<(), ApiError> {
    if !is_valid_name(&account.first_name) {
        return Err(ApiError::Validation(
            "First name is required, 100 characters at most".into(),
        ));
    }
    if !is_valid_name(&account.last_name) {
        return Err(ApiError::Validation(
            "Last name is required, 100 characters at most".into(),
        ));
    }
    if let Some(phone) = account.phone.as_deref() {
        if !is_valid_phone(phone) {
            return Err(ApiError::Validation("Phone must be 10 digits".into()));
        }
    }
    if !is_valid_email(&account.email) {
        return Err(ApiError::Validation(
            "Email is required, must be valid and unique".into(),
        ));
    }
    if !is_valid_password(&account.password) {
        return Err(ApiError::Validation(
            "Password is required and must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

async fn create_with_role(
    state: &AppState,
    account: NewAccount,
    role_name: &str,
) -> Result<(StatusCode, Json<ApiResponse<CreatedUserData>>), ApiError> {
    if repo::email_taken(&state.db, &account.email, None).await? {
        return Err(ApiError::Validation(
            "Email is required, must be valid and unique".into(),
        ));
    }

    let role = repo::find_role_by_name(&state.db, role_name)
        .await?
        .ok_or_else(|| ApiError::Validation("No role available to assign".into()))?;

    let password_hash = hash_password(&account.password).map_err(ApiError::Internal)?;
    let user = repo::create(
        &state.db,
        NewUser {
            first_name: &account.first_name,
            last_name: &account.last_name,
            phone: account.phone.as_deref(),
            email: &account.email,
            password_hash: &password_hash,
        },
    )
    .await?;
    repo::attach_role(&state.db, user.id, role.id).await?;

    info!(user_id = %user.id, role = %role.name, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            format!("User created successfully with role: {}", role.name),
            CreatedUserData { created_user: user },
        )),
    ))
}

#[instrument(skip(state, payload))]
pub async fn register_admin(
    State(state): State<AppState>,
    Json(payload): Json<RegisterAdminRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedUserData>>), ApiError> {
    let account = NewAccount {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        email: payload.email.trim().to_string(),
        password: payload.password,
    };
    validate_new_account(&account)?;
    if !is_valid_email(payload.email_creator.trim()) || !is_valid_password(&payload.password_creator)
    {
        return Err(ApiError::Validation(
            "Creator credentials are required".into(),
        ));
    }

    let store = PgAuthStore::new(state.db.clone());
    let creator = store
        .find_by_email(payload.email_creator.trim())
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid creator credentials".into()))?;
    if !verify_password(&payload.password_creator, &creator.password_hash)
        .map_err(ApiError::Internal)?
    {
        return Err(ApiError::Unauthorized("Invalid creator credentials".into()));
    }

    if !policy::may_register_admins(&creator, &state.config) {
        warn!(creator_id = %creator.id, "admin registration denied");
        return Err(ApiError::Forbidden(
            "The creator account is not allowed to register admins".into(),
        ));
    }

    create_with_role(&state, account, ROLE_ADMIN).await
}

#[instrument(skip(state, payload))]
pub async fn register_visit(
    State(state): State<AppState>,
    Json(payload): Json<RegisterVisitRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedUserData>>), ApiError> {
    let account = NewAccount {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        email: payload.email.trim().to_string(),
        password: payload.password,
    };
    validate_new_account(&account)?;
    create_with_role(&state, account, ROLE_VISITOR).await
}

#[instrument(skip(state))]
pub async fn my_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let store = PgAuthStore::new(state.db.clone());
    let user = service::load_user(&store, user_id)
        .await
        .map_err(|_| ApiError::Unauthorized("User not found in token".into()))?;

    let roles = auth_repo::roles_of(&state.db, user.id).await.map_err(ApiError::Internal)?;
    if roles.is_empty() {
        return Err(ApiError::NoRoleAssigned);
    }

    Ok(Json(ProfileResponse {
        envelope: ApiResponse::ok("User profile fetched successfully", user),
        role_info: roles,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(editor_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserRecord>>, ApiError> {
    if editor_id != id {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action".into(),
        ));
    }

    let store = PgAuthStore::new(state.db.clone());
    service::load_user(&store, id).await?;

    if let Some(first_name) = payload.first_name.as_deref() {
        if !is_valid_name(first_name) {
            return Err(ApiError::Validation(
                "First name must be 100 characters at most".into(),
            ));
        }
    }
    if let Some(last_name) = payload.last_name.as_deref() {
        if !is_valid_name(last_name) {
            return Err(ApiError::Validation(
                "Last name must be 100 characters at most".into(),
            ));
        }
    }
    if let Some(phone) = payload.phone.as_deref() {
        if !is_valid_phone(phone) {
            return Err(ApiError::Validation("Phone must be 10 digits".into()));
        }
    }
    if let Some(email) = payload.email.as_deref() {
        if !is_valid_email(email) {
            return Err(ApiError::Validation("Email must be valid and unique".into()));
        }
        if repo::email_taken(&state.db, email, Some(id)).await? {
            return Err(ApiError::Validation("Email must be valid and unique".into()));
        }
    }
    let password_hash = match payload.password.as_deref() {
        Some(password) if !is_valid_password(password) => {
            return Err(ApiError::Validation(
                "Password must be at least 8 characters".into(),
            ));
        }
        Some(password) => Some(hash_password(password).map_err(ApiError::Internal)?),
        None => None,
    };

    let user = repo::update_profile(
        &state.db,
        id,
        ProfileChanges {
            first_name: payload.first_name.as_deref(),
            last_name: payload.last_name.as_deref(),
            phone: payload.phone.as_deref(),
            email: payload.email.as_deref(),
            password_hash: password_hash.as_deref(),
        },
    )
    .await?;

    info!(user_id = %id, "profile updated");
    Ok(Json(ApiResponse::ok("Profile updated successfully", user)))
}

#[instrument(skip(state))]
pub async fn deactivate_account(
    State(state): State<AppState>,
    AuthUser(editor_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if editor_id != id {
        return Err(ApiError::Forbidden(
            "You do not have permission to perform this action".into(),
        ));
    }

    let store = PgAuthStore::new(state.db.clone());
    service::load_user(&store, id).await?;
    repo::set_status(&state.db, id, STATUS_INACTIVE).await?;

    info!(user_id = %id, "account deactivated");
    Ok(Json(ApiResponse::message("Account deactivated successfully")))
}
