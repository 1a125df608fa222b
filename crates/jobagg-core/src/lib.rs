//! Canonical listing model shared by the adapters, the writer and the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "jobagg-core";

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_CITY: &str = "Unknown City";
pub const UNKNOWN_STATE: &str = "Unknown State";
pub const UNKNOWN_LOCATION: &str = "Unknown Location";
pub const UNKNOWN_TYPE: &str = "Unknown Type";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const DEFAULT_CURRENCY: &str = "USD";

/// Identifier of an upstream provider. Used as the namespace of every
/// `external_id` the provider produces, so it must never be renamed.
pub const PROVIDER_ONE: &str = "provider1";
pub const PROVIDER_TWO: &str = "provider2";

/// Normalized job posting produced by an adapter, consumed once by the writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedListing {
    pub external_id: String,
    pub title: String,
    pub city: String,
    pub state: String,
    pub full_address: String,
    pub is_remote: bool,
    pub employment_type: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: String,
    pub salary_original_range: Option<String>,
    pub company_name: String,
    pub company_industry: Option<String>,
    pub company_website: Option<String>,
    pub experience_years: Option<i32>,
    pub skills: Vec<String>,
    pub posted_date: DateTime<Utc>,
    pub provider: String,
}

/// Persisted listing. `id` is the storage identity and is unrelated to `external_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredListing {
    pub id: i64,
    pub fetched_date: DateTime<Utc>,
    #[serde(flatten)]
    pub listing: UnifiedListing,
}

impl StoredListing {
    pub fn external_id(&self) -> &str {
        &self.listing.external_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Skill {
    pub id: i64,
    pub name: String,
}
