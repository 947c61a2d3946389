//! Authentication routes for registration and login.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use ferrobank_core::auth::{hash_password, verify_password};
use ferrobank_db::repositories::user::{UserError, UserRepository};
use ferrobank_shared::auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

fn user_info(user: ferrobank_db::entities::users::Model) -> UserInfo {
    UserInfo {
        username: user.username,
        full_name: user.full_name,
        email: user.email,
        created_at: user.created_at.to_utc(),
    }
}

/// POST /auth/register - Register a new user.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    // Check if email already exists
    match user_repo.email_exists(&payload.email).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "already_exists",
                    "message": "An account with this email already exists"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Database error checking email");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during registration"
                })),
            )
                .into_response();
        }
    }

    // Hash password
    let hashed_password = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during registration"
                })),
            )
                .into_response();
        }
    };

    // Create user; duplicate username/email is a conflict, not a server error
    let user = match user_repo
        .create(
            &payload.username,
            &hashed_password,
            &payload.full_name,
            &payload.email,
        )
        .await
    {
        Ok(u) => u,
        Err(e @ (UserError::DuplicateUsername(_) | UserError::DuplicateEmail(_))) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "already_exists",
                    "message": e.to_string()
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during registration"
                })),
            )
                .into_response();
        }
    };

    info!(username = %user.username, "User registered");

    (StatusCode::CREATED, Json(json!({ "user": user_info(user) }))).into_response()
}

/// POST /auth/login - Authenticate user and return a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    // Find user by username
    let user = match user_repo.find_by_username(&payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(username = %payload.username, "Login attempt for non-existent user");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid username or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during login"
                })),
            )
                .into_response();
        }
    };

    // Verify password
    match verify_password(&payload.password, &user.hashed_password) {
        Ok(true) => {}
        Ok(false) => {
            info!(username = %user.username, "Failed login attempt - invalid password");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid username or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during login"
                })),
            )
                .into_response();
        }
    }

    // Issue token via the configured maker
    let access_token = match state
        .token_maker
        .create_token(&user.username, state.token_duration)
    {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to create access token");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred during login"
                })),
            )
                .into_response();
        }
    };

    info!(username = %user.username, "User logged in successfully");

    let response = LoginResponse {
        user: user_info(user),
        access_token,
        expires_in: state.token_duration.num_seconds(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
