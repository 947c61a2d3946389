//! Signed-claim token maker (HS256 JWT).

use chrono::Duration;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use super::{MIN_SYMMETRIC_KEY_LEN, TokenError, TokenMaker, TokenPayload};

/// The only algorithm this maker signs with or accepts.
const PINNED_ALGORITHM: Algorithm = Algorithm::HS256;

/// Token maker backed by HMAC-signed JWTs.
///
/// The algorithm is pinned on both sides: tokens are signed with HS256 and
/// verification rejects any token whose header declares anything else,
/// including `none`, before the signature is examined.
pub struct JwtMaker {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtMaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtMaker")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtMaker {
    /// Creates a new maker from symmetric key material.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::KeyTooShort` if the key is shorter than
    /// [`MIN_SYMMETRIC_KEY_LEN`] bytes.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.len() < MIN_SYMMETRIC_KEY_LEN {
            return Err(TokenError::KeyTooShort(secret.len()));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(PINNED_ALGORITHM);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        validation
    }
}

impl TokenMaker for JwtMaker {
    fn create_token(&self, username: &str, duration: Duration) -> Result<String, TokenError> {
        let payload = TokenPayload::new(username, duration);

        encode(&Header::new(PINNED_ALGORITHM), &payload, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    fn verify_token(&self, token: &str) -> Result<TokenPayload, TokenError> {
        decode::<TokenPayload>(token, &self.decoding_key, &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidAlgorithm => TokenError::AlgorithmMismatch,
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            })
    }
}
