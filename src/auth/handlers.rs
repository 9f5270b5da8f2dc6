use axum::{
    extract::{FromRef, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::auth::dto::{
    ChangePasswordRequest, LoginRequest, LoginResponse, PassResetRequest, PasswordChangedData,
    RefreshData, RefreshRequest, RefreshUser, ResetTokenResponse, ResetUserData, SessionData,
    ValidatorCodeRequest, Verify2faRequest,
};
use crate::auth::jwt::JwtKeys;
use crate::auth::repo::PgAuthStore;
use crate::auth::service;
use crate::auth::store::AuthStore;
use crate::response::{ApiError, ApiResponse};
use crate::state::AppState;
use crate::validate::{is_valid_code, is_valid_email, is_valid_password};

/// Public authentication endpoints, mounted under `/api/auth`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/verify-2fa", post(verify2fa))
        .route("/users/refresh-token", post(refresh))
        .route("/UsOp/passResetRequest", post(pass_reset_request))
        .route("/UsOp/validatorCode", post(validator_code))
        .route("/UsOp/changePassword", post(change_password))
}

/// Session-holder endpoints, mounted under `/api`.
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_string();

    if !is_valid_email(&payload.email) {
        warn!("login validation failed: email");
        return Err(ApiError::Validation("A valid email is required".into()));
    }
    if !is_valid_password(&payload.password) {
        warn!("login validation failed: password");
        return Err(ApiError::Validation(
            "Password is required and must be at least 8 characters".into(),
        ));
    }

    let store = PgAuthStore::new(state.db.clone());
    let outcome = service::login(&store, &state.mailer, &payload.email, &payload.password).await?;

    Ok(Json(LoginResponse {
        envelope: ApiResponse::ok(
            "Login successful, authentication code sent by email",
            outcome.masked_email,
        ),
        temporary_token: outcome.temporary_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn verify2fa(
    State(state): State<AppState>,
    Json(payload): Json<Verify2faRequest>,
) -> Result<Json<ApiResponse<SessionData>>, ApiError> {
    if payload.temporary_token.is_empty() || !is_valid_code(&payload.code) {
        return Err(ApiError::Validation(
            "The temporary token and the 6-digit code are required".into(),
        ));
    }

    let store = PgAuthStore::new(state.db.clone());
    let keys = JwtKeys::from_ref(&state);
    let session =
        service::verify_two_factor(&store, &keys, &payload.temporary_token, &payload.code).await?;

    Ok(Json(ApiResponse::ok(
        "2FA verified successfully",
        SessionData {
            user: session.user,
            role: session.role,
            token: session.tokens.token,
            refresh_token: session.tokens.refresh_token,
        },
    )))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshData>>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token".into()))?;

    let store = PgAuthStore::new(state.db.clone());
    let user = service::load_user(&store, claims.sub)
        .await
        .map_err(|_| ApiError::Unauthorized("User not found".into()))?;
    let roles = store.roles_of(user.id).await.map_err(ApiError::Internal)?;
    let pair = keys.mint_pair(user.id).map_err(ApiError::Internal)?;

    info!(user_id = %user.id, "session refreshed");
    Ok(Json(ApiResponse::ok(
        "Token renewed successfully",
        RefreshData {
            token: pair.token,
            refresh_token: pair.refresh_token,
            user: RefreshUser {
                id: user.id,
                first_name: user.first_name,
                last_name: user.last_name,
                role: service::first_role_name(&roles),
            },
        },
    )))
}

/// Logout is an acknowledgement: the session credential is stateless, so the
/// client discards it. A missing token is still a 400 per the contract.
#[instrument(skip(state, headers))]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Validation("Token not provided".into()))?;

    let keys = JwtKeys::from_ref(&state);
    keys.verify(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".into()))?;

    Ok(Json(ApiResponse::message("Logout successful")))
}

#[instrument(skip(state, payload))]
pub async fn pass_reset_request(
    State(state): State<AppState>,
    Json(mut payload): Json<PassResetRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    payload.email = payload.email.trim().to_string();
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("A valid email is required".into()));
    }

    let store = PgAuthStore::new(state.db.clone());
    let email = service::request_password_reset(&store, &state.mailer, &payload.email).await?;

    Ok(Json(ApiResponse::ok(
        "Password reset email sent",
        email,
    )))
}

#[instrument(skip(state, payload))]
pub async fn validator_code(
    State(state): State<AppState>,
    Json(payload): Json<ValidatorCodeRequest>,
) -> Result<Json<ResetTokenResponse>, ApiError> {
    if !is_valid_code(&payload.code) {
        return Err(ApiError::Validation("The 6-digit code is required".into()));
    }

    let store = PgAuthStore::new(state.db.clone());
    let issued = service::validate_reset_code(&store, &payload.code).await?;

    Ok(Json(ResetTokenResponse {
        envelope: ApiResponse::ok(
            "Code verified successfully",
            ResetUserData {
                user_id: issued.user.id,
                email: issued.user.email,
                first_name: issued.user.first_name,
                last_name: issued.user.last_name,
            },
        ),
        reset_token: issued.reset_token,
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<PasswordChangedData>>, ApiError> {
    if payload.reset_token.is_empty() {
        return Err(ApiError::Validation("The reset token is required".into()));
    }
    if !is_valid_password(&payload.password) {
        return Err(ApiError::Validation(
            "The new password is required and must be at least 8 characters".into(),
        ));
    }

    let store = PgAuthStore::new(state.db.clone());
    let user = service::change_password(&store, &payload.reset_token, &payload.password).await?;

    Ok(Json(ApiResponse::ok(
        "Password updated successfully",
        PasswordChangedData {
            user_id: user.id,
            email: user.email,
            password_changed_at: OffsetDateTime::now_utc(),
        },
    )))
}
