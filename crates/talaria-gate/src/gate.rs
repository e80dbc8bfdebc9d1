//! The access gate.

use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use talaria_core::{AuthConfig, AuthMode, CallerIdentity, DispatchError, TOKEN_FIELD};

use crate::decoder::TokenDecoder;
use crate::store::IdentityStore;

/// Errors produced by credential verification.
#[derive(Debug, Error)]
pub enum GateError {
    /// The credential was missing, blank, undecodable, or unverifiable.
    #[error("credential rejected: {parameter}")]
    Rejected {
        /// The parameter name carried in the error response.
        parameter: String,
    },

    /// The identity store failed; not the caller's fault.
    #[error("identity store failure")]
    Store(#[source] anyhow::Error),
}

impl GateError {
    fn rejected() -> Self {
        Self::Rejected {
            parameter: TOKEN_FIELD.to_string(),
        }
    }
}

impl From<GateError> for DispatchError {
    fn from(error: GateError) -> Self {
        match error {
            GateError::Rejected { parameter } => Self::auth(parameter),
            GateError::Store(source) => Self::unknown(source),
        }
    }
}

/// Verifies access credentials against the configured backend.
///
/// # Example
///
/// ```ignore
/// let gate = AccessGate::new(&config.auth, Arc::new(Hs256Decoder::new()), None);
/// let identity = gate.verify(envelope.access_token()).await?;
/// ```
pub struct AccessGate<'a> {
    config: &'a AuthConfig,
    decoder: Arc<dyn TokenDecoder>,
    store: Option<Arc<dyn IdentityStore>>,
}

impl<'a> AccessGate<'a> {
    /// Creates a gate over the process-wide auth configuration.
    ///
    /// The store may be `None` in claim-only mode; store-backed mode
    /// without a store is an infrastructure error at verification time.
    #[must_use]
    pub fn new(
        config: &'a AuthConfig,
        decoder: Arc<dyn TokenDecoder>,
        store: Option<Arc<dyn IdentityStore>>,
    ) -> Self {
        Self {
            config,
            decoder,
            store,
        }
    }

    /// Verifies a credential, resolving it to the caller's identity.
    pub async fn verify(&self, credential: Option<&str>) -> Result<CallerIdentity, GateError> {
        let token = match credential {
            Some(token) if !token.trim().is_empty() => token.trim(),
            _ => return Err(GateError::rejected()),
        };

        let claims = self
            .decoder
            .decode(token, &self.config.token_secret)
            .ok_or_else(GateError::rejected)?;

        let claim_id = claims
            .get(&self.config.claim_id_key)
            .and_then(claim_as_string)
            .ok_or_else(GateError::rejected)?;

        match self.config.mode {
            AuthMode::Claim => Ok(CallerIdentity::from_claim(claim_id)),
            AuthMode::ClaimStore => self.verify_against_store(token, claim_id).await,
        }
    }

    async fn verify_against_store(
        &self,
        token: &str,
        claim_id: String,
    ) -> Result<CallerIdentity, GateError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| GateError::Store(anyhow::anyhow!("no identity store configured")))?;

        let mut criteria = IndexMap::new();
        criteria.insert(self.config.store_access_key.clone(), token.to_string());
        criteria.insert(self.config.store_id_key.clone(), claim_id.clone());

        let mut records = store
            .find(&self.config.store_table, &criteria)
            .await
            .map_err(GateError::Store)?;

        if records.is_empty() {
            return Err(GateError::rejected());
        }
        Ok(CallerIdentity::from_claim(claim_id).with_record(records.swap_remove(0)))
    }
}

fn claim_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
