//! Encrypted-payload token maker (XChaCha20-Poly1305).

use chacha20poly1305::{
    AeadCore, XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, OsRng},
};
use chrono::Duration;

use super::{MIN_SYMMETRIC_KEY_LEN, TokenError, TokenMaker, TokenPayload};

/// Nonce length of XChaCha20-Poly1305.
const NONCE_LEN: usize = 24;
/// Poly1305 authentication tag length.
const TAG_LEN: usize = 16;

/// Token maker backed by authenticated encryption.
///
/// The whole payload is encrypted, so confidentiality and integrity both
/// come from decryption success. The wire form is
/// `base64url(nonce || ciphertext)` with a fresh random nonce per token.
/// The scheme is fixed; there is no algorithm header to confuse.
pub struct LocalMaker {
    cipher: XChaCha20Poly1305,
}

impl std::fmt::Debug for LocalMaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMaker")
            .field("cipher", &"[hidden]")
            .finish()
    }
}

impl LocalMaker {
    /// Creates a new maker from symmetric key material.
    ///
    /// The first 32 bytes become the cipher key; anything beyond is ignored.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::KeyTooShort` if the key is shorter than
    /// [`MIN_SYMMETRIC_KEY_LEN`] bytes.
    pub fn new(key: &[u8]) -> Result<Self, TokenError> {
        if key.len() < MIN_SYMMETRIC_KEY_LEN {
            return Err(TokenError::KeyTooShort(key.len()));
        }
        let cipher = XChaCha20Poly1305::new_from_slice(&key[..MIN_SYMMETRIC_KEY_LEN])
            .map_err(|_| TokenError::KeyTooShort(key.len()))?;
        Ok(Self { cipher })
    }
}

impl TokenMaker for LocalMaker {
    fn create_token(&self, username: &str, duration: Duration) -> Result<String, TokenError> {
        let payload = TokenPayload::new(username, duration);
        let plaintext =
            serde_json::to_vec(&payload).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(base64_url::encode(&raw))
    }

    fn verify_token(&self, token: &str) -> Result<TokenPayload, TokenError> {
        let raw = base64_url::decode(token).map_err(|_| TokenError::Malformed)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(TokenError::Malformed);
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| TokenError::SignatureInvalid)?;

        let payload: TokenPayload =
            serde_json::from_slice(&plaintext).map_err(|_| TokenError::Malformed)?;
        payload.check_expiry()?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_KEY: &[u8] = b"test-symmetric-key-32-bytes-long!";
    const OTHER_KEY: &[u8] = b"another-symmetric-key-32-bytes-!!";

    fn maker() -> LocalMaker {
        LocalMaker::new(TEST_KEY).unwrap()
    }

    #[test]
    fn test_short_key_rejected_at_construction() {
        let result = LocalMaker::new(&[0u8; 16]);
        assert_eq!(result.unwrap_err(), TokenError::KeyTooShort(16));
    }

    #[test]
    fn test_round_trip() {
        let maker = maker();
        let token = maker.create_token("bob", Duration::minutes(10)).unwrap();
        let payload = maker.verify_token(&token).unwrap();

        assert_eq!(payload.username(), "bob");
        assert_eq!(payload.exp - payload.iat, 10 * 60);
    }

    #[test]
    fn test_tokens_are_opaque_and_distinct() {
        // Fresh nonce per token: same subject and duration never repeats.
        let maker = maker();
        let a = maker.create_token("bob", Duration::minutes(10)).unwrap();
        let b = maker.create_token("bob", Duration::minutes(10)).unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("bob"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let maker = maker();
        let token = maker.create_token("bob", Duration::seconds(-1)).unwrap();

        assert_eq!(maker.verify_token(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_key_is_decryption_error_not_expiry() {
        let token = maker().create_token("bob", Duration::minutes(5)).unwrap();
        let other = LocalMaker::new(OTHER_KEY).unwrap();

        assert_eq!(
            other.verify_token(&token),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let maker = maker();
        let token = maker.create_token("bob", Duration::minutes(5)).unwrap();

        let mut raw = base64_url::decode(&token).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = base64_url::encode(&raw);

        assert_eq!(
            maker.verify_token(&tampered),
            Err(TokenError::SignatureInvalid)
        );
    }

    #[test]
    fn test_garbage_is_malformed() {
        let maker = maker();
        assert_eq!(maker.verify_token("%%%"), Err(TokenError::Malformed));
        assert_eq!(maker.verify_token("c2hvcnQ"), Err(TokenError::Malformed));
    }
}
