//! Provider adapter contracts + the per-provider fetch/normalize implementations.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobagg_core::{UnifiedListing, PROVIDER_ONE, PROVIDER_TWO};
use jobagg_storage::{FetchError, HttpFetcher};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

pub mod parse;
mod provider_one;
mod provider_two;

pub use provider_one::{ProviderOneAdapter, ProviderOneCompany, ProviderOneDetails, ProviderOneJob};
pub use provider_two::{
    ProviderTwoAdapter, ProviderTwoCompensation, ProviderTwoEmployer, ProviderTwoJob,
    ProviderTwoLocation, ProviderTwoRequirements,
};

pub const CRATE_NAME: &str = "jobagg-adapters";

pub const DEFAULT_PROVIDER_ONE_URL: &str = "https://assignment.devotel.io/api/provider1/jobs";
pub const DEFAULT_PROVIDER_TWO_URL: &str = "https://assignment.devotel.io/api/provider2/jobs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterContext {
    pub run_id: Uuid,
    /// Ingestion time; also the fallback for unparseable posted dates.
    pub fetched_at: DateTime<Utc>,
}

impl AdapterContext {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            fetched_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("unexpected response envelope: {0}")]
    Envelope(String),
    #[error("provider returned status: {0}")]
    ProviderStatus(String),
}

/// One upstream source: fetch its provider-specific records, then map them
/// onto [`UnifiedListing`]. `normalize` is pure and total.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    type Record: Send;

    fn provider_id(&self) -> &'static str;

    async fn fetch(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
    ) -> Result<Vec<Self::Record>, AdapterError>;

    fn normalize(&self, records: Vec<Self::Record>, ctx: &AdapterContext) -> Vec<UnifiedListing>;
}

/// Object-safe view of a [`ProviderAdapter`], used by the orchestrator to hold
/// heterogeneous providers side by side.
#[async_trait]
pub trait ListingSource: Send + Sync {
    fn provider_id(&self) -> &'static str;

    async fn collect(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
    ) -> Result<Vec<UnifiedListing>, AdapterError>;
}

#[async_trait]
impl<A> ListingSource for A
where
    A: ProviderAdapter,
{
    fn provider_id(&self) -> &'static str {
        ProviderAdapter::provider_id(self)
    }

    async fn collect(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
    ) -> Result<Vec<UnifiedListing>, AdapterError> {
        let records = self.fetch(http, ctx).await?;
        Ok(self.normalize(records, ctx))
    }
}

pub fn known_providers() -> &'static [&'static str] {
    &[PROVIDER_ONE, PROVIDER_TWO]
}

pub fn adapter_for_provider(provider_id: &str, url: &str) -> Option<Arc<dyn ListingSource>> {
    match provider_id {
        PROVIDER_ONE => Some(Arc::new(ProviderOneAdapter::new(url))),
        PROVIDER_TWO => Some(Arc::new(ProviderTwoAdapter::new(url))),
        _ => None,
    }
}

pub fn default_url_for(provider_id: &str) -> Option<&'static str> {
    match provider_id {
        PROVIDER_ONE => Some(DEFAULT_PROVIDER_ONE_URL),
        PROVIDER_TWO => Some(DEFAULT_PROVIDER_TWO_URL),
        _ => None,
    }
}

fn json_at<'a>(value: &'a JsonValue, path: &[&str]) -> Option<&'a JsonValue> {
    let mut cur = value;
    for segment in path {
        cur = cur.get(*segment)?;
    }
    if cur.is_null() {
        None
    } else {
        Some(cur)
    }
}

pub(crate) fn json_str(value: &JsonValue, path: &[&str]) -> Option<String> {
    json_at(value, path)?.as_str().map(ToString::to_string)
}

/// String or number rendered as text; upstream ids arrive as either.
pub(crate) fn json_text(value: &JsonValue, path: &[&str]) -> Option<String> {
    match json_at(value, path)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn json_f64(value: &JsonValue, path: &[&str]) -> Option<f64> {
    json_at(value, path)?.as_f64()
}

pub(crate) fn json_i64(value: &JsonValue, path: &[&str]) -> Option<i64> {
    json_at(value, path)?.as_i64()
}

pub(crate) fn json_bool(value: &JsonValue, path: &[&str]) -> Option<bool> {
    json_at(value, path)?.as_bool()
}

pub(crate) fn json_array(value: &JsonValue, path: &[&str]) -> Vec<JsonValue> {
    json_at(value, path)
        .and_then(JsonValue::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_knows_both_providers() {
        for provider in known_providers() {
            let url = default_url_for(provider).unwrap();
            let adapter = adapter_for_provider(provider, url).unwrap();
            assert_eq!(adapter.provider_id(), *provider);
        }
        assert!(adapter_for_provider("provider3", "http://localhost").is_none());
        assert!(default_url_for("provider3").is_none());
    }

    #[test]
    fn json_helpers_tolerate_wrong_shapes() {
        let value = json!({
            "id": 17,
            "name": "x",
            "nested": { "flag": true, "n": 2.5, "list": [1, "a"] },
            "nothing": null
        });
        assert_eq!(json_text(&value, &["id"]).as_deref(), Some("17"));
        assert_eq!(json_str(&value, &["id"]), None);
        assert_eq!(json_str(&value, &["nothing"]), None);
        assert_eq!(json_bool(&value, &["nested", "flag"]), Some(true));
        assert_eq!(json_f64(&value, &["nested", "n"]), Some(2.5));
        assert_eq!(json_i64(&value, &["nested", "n"]), None);
        assert_eq!(json_array(&value, &["nested", "list"]).len(), 2);
        assert!(json_array(&value, &["name"]).is_empty());
        assert!(json_array(&value, &["missing", "deeper"]).is_empty());
    }
}
