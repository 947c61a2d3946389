//! Authentication middleware for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::info;

use crate::AppState;
use ferrobank_core::TokenPayload;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// The single response body for every authentication failure.
///
/// Missing header, malformed token, bad signature, wrong algorithm, and
/// expiry all look identical to the client; the concrete kind only goes to
/// the logs. Differentiated bodies would give an attacker an oracle for
/// probing why a forged token was rejected.
fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "authentication_failed",
            "message": "Authentication failed"
        })),
    )
        .into_response()
}

/// Authentication middleware that verifies bearer tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Verifies the token using the configured token maker
/// 3. Stores the payload in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        info!("request without bearer token rejected");
        return unauthorized_response();
    };

    match state.token_maker.verify_token(token) {
        Ok(payload) => {
            request.extensions_mut().insert(payload);
            next.run(request).await
        }
        Err(e) => {
            info!(kind = %e, "token verification failed");
            unauthorized_response()
        }
    }
}

/// Extractor for the authenticated principal.
///
/// Use this in handlers to get the verified token payload:
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let username = auth.username();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub TokenPayload);

impl AuthUser {
    /// Returns the authenticated username.
    #[must_use]
    pub fn username(&self) -> &str {
        self.0.username()
    }

    /// Returns the inner token payload.
    #[must_use]
    pub const fn payload(&self) -> &TokenPayload {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TokenPayload>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(unauthorized_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }
}
