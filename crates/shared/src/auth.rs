//! Auth request and response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Unique username.
    pub username: String,
    /// User password (hashed before storage).
    pub password: String,
    /// User full name.
    pub full_name: String,
    /// User email.
    pub email: String,
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// User password.
    pub password: String,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Bearer access token.
    pub access_token: String,
    /// Token expiration in seconds.
    pub expires_in: i64,
}

/// User info returned in auth responses. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// Username.
    pub username: String,
    /// User full name.
    pub full_name: String,
    /// User email.
    pub email: String,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}
