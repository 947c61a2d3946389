//! Session token creation and verification.
//!
//! Two interchangeable token makers sit behind the [`TokenMaker`] trait:
//! [`JwtMaker`] issues signed-claim tokens (HS256), [`LocalMaker`] issues
//! encrypted-payload tokens (XChaCha20-Poly1305). Which one runs is a
//! deployment decision; callers only ever see the trait.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

mod jwt;
mod local;

pub use jwt::JwtMaker;
pub use local::LocalMaker;

/// Minimum symmetric key length in bytes (256 bits).
pub const MIN_SYMMETRIC_KEY_LEN: usize = 32;

/// Errors that can occur during token operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Symmetric key is shorter than [`MIN_SYMMETRIC_KEY_LEN`].
    #[error("symmetric key must be at least {MIN_SYMMETRIC_KEY_LEN} bytes, got {0}")]
    KeyTooShort(usize),

    /// Token is structurally malformed.
    #[error("token is malformed")]
    Malformed,

    /// Token declares an algorithm other than the pinned one.
    #[error("token algorithm mismatch")]
    AlgorithmMismatch,

    /// Signature verification or decryption failed.
    #[error("token signature or decryption invalid")]
    SignatureInvalid,

    /// Token has expired.
    #[error("token has expired")]
    Expired,

    /// Token encoding failed at creation time.
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

/// Capability interface for issuing and verifying bearer tokens.
///
/// Implementations must be cheap to share across request handlers; the only
/// state they hold is the immutable symmetric key material.
pub trait TokenMaker: Send + Sync {
    /// Creates a token for `username` valid for `duration` from now.
    fn create_token(&self, username: &str, duration: Duration) -> Result<String, TokenError>;

    /// Verifies a token and returns its payload.
    fn verify_token(&self, token: &str) -> Result<TokenPayload, TokenError>;
}

/// Payload carried by every session token.
///
/// The absolute expiry is fixed at creation time (`iat + duration`) and is
/// never re-derived during verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Unique token ID.
    pub jti: Uuid,
    /// Subject (username).
    pub sub: String,
    /// Issued-at timestamp (Unix seconds).
    pub iat: i64,
    /// Expiration timestamp (Unix seconds).
    pub exp: i64,
}

impl TokenPayload {
    /// Creates a new payload for `username`, expiring `duration` from now.
    #[must_use]
    pub fn new(username: &str, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            jti: Uuid::new_v4(),
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + duration).timestamp(),
        }
    }

    /// Returns the subject username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.sub
    }

    /// Returns the unique token ID.
    #[must_use]
    pub const fn token_id(&self) -> Uuid {
        self.jti
    }

    /// Returns the issued-at timestamp.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or_default()
    }

    /// Returns the expiry timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Checks the payload against the current clock.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` if the expiry has passed.
    pub fn check_expiry(&self) -> Result<(), TokenError> {
        if Utc::now().timestamp() > self.exp {
            Err(TokenError::Expired)
        } else {
            Ok(())
        }
    }
}
