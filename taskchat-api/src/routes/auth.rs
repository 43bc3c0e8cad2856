/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST {prefix}/auth/register` - Create an account
/// - `POST {prefix}/auth/login` - Exchange credentials for an access token
/// - `GET {prefix}/auth/me` - Current user
/// - `PATCH {prefix}/auth/me` - Update email or name
/// - `DELETE {prefix}/auth/me` - Delete the account with all its tasks and threads

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::Json,
};
use axum::{extract::State, http::StatusCode, Extension};
use serde::{Deserialize, Serialize};
use taskchat_shared::{
    auth::{middleware::AuthContext, password},
    models::user::{CreateUser, UpdateUser, User, UserRead},
};
use validator::Validate;

/// Login request
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Access token response
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    /// Always `bearer`
    pub token_type: String,

    /// Token lifetime in seconds
    pub expires_in: i64,
}

/// Register a new user
///
/// ```text
/// POST {prefix}/auth/register
/// Content-Type: application/json
///
/// { "email": "user@example.com", "password": "correct horse", "name": "Jane" }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUser>,
) -> ApiResult<(StatusCode, Json<UserRead>)> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;
    let user = User::create(&state.db, req.into_new_user(password_hash)).await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserRead::from(user))))
}

/// Login with email and password
///
/// An unknown email and a wrong password produce the same
/// `401 invalid_credentials` response.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    let access_token = state.tokens.issue(user.id)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in: state.tokens.expires_in().num_seconds(),
    }))
}

/// Returns the authenticated user
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserRead>> {
    let user = User::find_by_id(&state.db, auth.user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// Updates the authenticated user's email and/or name
///
/// # Errors
///
/// - `409 Conflict`: New email belongs to another account
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateUser>,
) -> ApiResult<Json<UserRead>> {
    req.validate()?;

    let user = if req.is_empty() {
        User::find_by_id(&state.db, auth.user_id).await?
    } else {
        User::update(&state.db, auth.user_id, req).await?
    }
    .ok_or(ApiError::UserNotFound)?;

    Ok(Json(user.into()))
}

/// Deletes the authenticated user's account
///
/// Tasks, threads and messages go with it.
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<StatusCode> {
    if !User::delete(&state.db, auth.user_id).await? {
        return Err(ApiError::UserNotFound);
    }

    tracing::info!(user_id = %auth.user_id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
