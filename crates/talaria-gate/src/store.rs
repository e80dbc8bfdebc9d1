//! Identity store seam.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

/// External record store consulted in store-backed verification.
///
/// The gate queries by the configured credential and identity-claim
/// columns; how the store resolves the query (SQL, KV, remote service) is
/// the implementor's concern.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Finds records in `table` matching every criteria pair.
    ///
    /// # Errors
    ///
    /// Infrastructure failures only; an empty result is `Ok(vec![])`.
    async fn find(
        &self,
        table: &str,
        criteria: &IndexMap<String, String>,
    ) -> anyhow::Result<Vec<Value>>;
}
