//! Token decoding seam.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

/// Decodes an access credential into its claims.
///
/// A `None` return means the token is undecodable for any reason; the gate
/// deliberately does not distinguish why.
pub trait TokenDecoder: Send + Sync {
    /// Decodes the token with the configured secret.
    fn decode(&self, token: &str, secret: &str) -> Option<Map<String, Value>>;
}

/// HS256 JWT decoder.
///
/// Only the HMAC algorithm is accepted; tokens signed any other way are
/// rejected at the header, which closes the usual algorithm-confusion hole.
#[derive(Debug, Clone)]
pub struct Hs256Decoder {
    require_expiry: bool,
}

impl Default for Hs256Decoder {
    fn default() -> Self {
        Self {
            require_expiry: true,
        }
    }
}

impl Hs256Decoder {
    /// Creates a decoder that requires an `exp` claim.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables the expiry requirement (long-lived integration tokens).
    #[must_use]
    pub fn without_expiry_check(mut self) -> Self {
        self.require_expiry = false;
        self
    }
}

impl TokenDecoder for Hs256Decoder {
    fn decode(&self, token: &str, secret: &str) -> Option<Map<String, Value>> {
        let mut validation = Validation::new(Algorithm::HS256);
        if !self.require_expiry {
            validation.required_spec_claims.clear();
            validation.validate_exp = false;
        }

        match decode::<Map<String, Value>>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        ) {
            Ok(data) => Some(data.claims),
            Err(error) => {
                tracing::debug!(%error, "access token failed to decode");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(claims: &Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_decodes_valid_token() {
        let tok = token(&json!({ "user_id": "u-42" }), "secret");
        let claims = Hs256Decoder::new()
            .without_expiry_check()
            .decode(&tok, "secret")
            .unwrap();
        assert_eq!(claims["user_id"], "u-42");
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let tok = token(&json!({ "user_id": "u-42" }), "secret");
        assert!(Hs256Decoder::new()
            .without_expiry_check()
            .decode(&tok, "other")
            .is_none());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Hs256Decoder::new().decode("not.a.jwt", "secret").is_none());
    }

    #[test]
    fn test_rejects_missing_expiry_when_required() {
        let tok = token(&json!({ "user_id": "u-42" }), "secret");
        assert!(Hs256Decoder::new().decode(&tok, "secret").is_none());
    }
}
