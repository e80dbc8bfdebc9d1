//! # Talaria Cipher
//!
//! Body encryption seam for the Talaria dispatch pipeline.
//!
//! The pipeline consumes encryption through the narrow [`BodyCipher`]
//! trait. One real implementation ships here: XChaCha20-Poly1305 with a
//! random 192-bit nonce and base64 transport encoding. Projects with other
//! requirements implement the trait themselves.

#![doc(html_root_url = "https://docs.rs/talaria-cipher/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use thiserror::Error;
use zeroize::Zeroize;

/// XChaCha20 nonce length in bytes.
const NONCE_LEN: usize = 24;

/// Result type for cipher operations.
pub type CipherResult<T> = Result<T, CipherError>;

/// Errors that can occur while encrypting or decrypting a body.
#[derive(Debug, Error)]
pub enum CipherError {
    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// The ciphertext was malformed or the key did not match.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    /// The transport encoding was not valid base64.
    #[error("invalid ciphertext encoding: {0}")]
    InvalidEncoding(String),
}

/// Encrypts and decrypts request/response bodies.
///
/// Ciphertext travels as a string because that is what the wire formats
/// carry; the encoding is the implementation's concern.
pub trait BodyCipher: Send + Sync {
    /// Encrypts a plaintext body to its wire form.
    fn encrypt(&self, plaintext: &[u8]) -> CipherResult<String>;

    /// Decrypts a wire-form ciphertext back to the plaintext body.
    fn decrypt(&self, ciphertext: &str) -> CipherResult<Vec<u8>>;
}

/// Secret key (256-bit), zeroed on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretKey([u8; 32]);

impl SecretKey {
    /// Creates a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generates a random key.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(bytes)
    }

    /// The raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("SecretKey(..)")
    }
}

/// XChaCha20-Poly1305 body cipher.
///
/// Wire form: `base64(nonce || ciphertext)`. The 192-bit nonce is random
/// per message, which is safe for this nonce size.
///
/// # Example
///
/// ```
/// use talaria_cipher::{BodyCipher, SecretKey, XChaChaBodyCipher};
///
/// let cipher = XChaChaBodyCipher::new(SecretKey::generate());
/// let wire = cipher.encrypt(b"{\"quantity\":3}").unwrap();
/// assert_eq!(cipher.decrypt(&wire).unwrap(), b"{\"quantity\":3}");
/// ```
pub struct XChaChaBodyCipher {
    key: SecretKey,
}

impl XChaChaBodyCipher {
    /// Creates a cipher around the given key.
    #[must_use]
    pub fn new(key: SecretKey) -> Self {
        Self { key }
    }
}

impl BodyCipher for XChaChaBodyCipher {
    fn encrypt(&self, plaintext: &[u8]) -> CipherResult<String> {
        let cipher = XChaCha20Poly1305::new(self.key.as_bytes().into());
        let mut nonce = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce);

        let ciphertext = cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let mut wire = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        wire.extend_from_slice(&nonce);
        wire.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(wire))
    }

    fn decrypt(&self, ciphertext: &str) -> CipherResult<Vec<u8>> {
        let wire = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| CipherError::InvalidEncoding(e.to_string()))?;
        if wire.len() <= NONCE_LEN {
            return Err(CipherError::DecryptionFailed(
                "ciphertext shorter than nonce".to_string(),
            ));
        }

        let (nonce, body) = wire.split_at(NONCE_LEN);
        let cipher = XChaCha20Poly1305::new(self.key.as_bytes().into());
        cipher
            .decrypt(XNonce::from_slice(nonce), body)
            .map_err(|e| CipherError::DecryptionFailed(e.to_string()))
    }
}
