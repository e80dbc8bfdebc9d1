//! Verified caller identity.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The identity a credential resolved to.
///
/// In claim-only mode this carries just the decoded identity claim; in
/// store-backed mode it additionally carries the matching store record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// The identity claim value (e.g. the user id).
    pub claim_id: String,
    /// The full store record, when store-backed verification is configured.
    pub record: Option<Value>,
}

impl CallerIdentity {
    /// An identity trusted directly from the decoded claim.
    #[must_use]
    pub fn from_claim(claim_id: impl Into<String>) -> Self {
        Self {
            claim_id: claim_id.into(),
            record: None,
        }
    }

    /// Attaches the store record backing this identity.
    #[must_use]
    pub fn with_record(mut self, record: Value) -> Self {
        self.record = Some(record);
        self
    }

    /// A string identifier suitable for logging. Never includes the token.
    #[must_use]
    pub fn log_id(&self) -> String {
        format!("caller:{}", self.claim_id)
    }
}
