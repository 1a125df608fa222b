use async_trait::async_trait;
use jobagg_core::{
    UnifiedListing, DEFAULT_CURRENCY, PROVIDER_TWO, UNKNOWN_CITY, UNKNOWN_COMPANY,
    UNKNOWN_LOCATION, UNKNOWN_STATE, UNKNOWN_TITLE,
};
use jobagg_storage::HttpFetcher;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::parse::{derive_content_id, non_blank, parse_posted_date, positive, sanitize_skills, text_or};
use crate::{
    json_array, json_bool, json_f64, json_i64, json_str, AdapterContext, AdapterError,
    ProviderAdapter,
};

pub const PROVIDER_TWO_EMPLOYMENT_TYPE: &str = "Full-time";

/// Stand-in for an absent field inside a derived id.
pub const MISSING_ID_PART: &str = "undefined";

/// Provider 2 envelope: `{ "status": "success", "data": { "jobsList": { key: job, .. } } }`.
/// Jobs carry no id of their own; see [`derive_content_id`].
#[derive(Debug, Clone)]
pub struct ProviderTwoAdapter {
    url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTwoJob {
    pub position: Option<String>,
    pub location: Option<ProviderTwoLocation>,
    pub compensation: Option<ProviderTwoCompensation>,
    pub employer: ProviderTwoEmployer,
    pub requirements: ProviderTwoRequirements,
    pub date_posted: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTwoLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub remote: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTwoCompensation {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTwoEmployer {
    pub company_name: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTwoRequirements {
    pub experience: Option<i64>,
    pub technologies: Vec<JsonValue>,
}

impl ProviderTwoJob {
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let location = value
            .get("location")
            .filter(|v| v.is_object())
            .map(|_| ProviderTwoLocation {
                city: json_str(value, &["location", "city"]),
                state: json_str(value, &["location", "state"]),
                remote: json_bool(value, &["location", "remote"]).unwrap_or(false),
            });
        let compensation = value
            .get("compensation")
            .filter(|v| v.is_object())
            .map(|_| ProviderTwoCompensation {
                min: json_f64(value, &["compensation", "min"]),
                max: json_f64(value, &["compensation", "max"]),
                currency: json_str(value, &["compensation", "currency"]),
            });
        Some(Self {
            position: json_str(value, &["position"]),
            location,
            compensation,
            employer: ProviderTwoEmployer {
                company_name: json_str(value, &["employer", "companyName"]),
                website: json_str(value, &["employer", "website"]),
            },
            requirements: ProviderTwoRequirements {
                experience: json_i64(value, &["requirements", "experience"]),
                technologies: json_array(value, &["requirements", "technologies"]),
            },
            date_posted: json_str(value, &["datePosted"]),
        })
    }

    /// Dedup key, derived from the raw (untrimmed) upstream values. A missing
    /// part renders as [`MISSING_ID_PART`], which keeps ids compatible with
    /// records already ingested under that rendering.
    pub fn derived_id(&self) -> String {
        derive_content_id(
            self.position.as_deref().unwrap_or(MISSING_ID_PART),
            self.employer.company_name.as_deref().unwrap_or(MISSING_ID_PART),
            self.date_posted.as_deref().unwrap_or(MISSING_ID_PART),
        )
    }
}

impl ProviderTwoAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn parse_envelope(&self, body: &JsonValue) -> Result<Vec<ProviderTwoJob>, AdapterError> {
        let status = json_str(body, &["status"]).unwrap_or_default();
        if status != "success" {
            return Err(AdapterError::ProviderStatus(if status.is_empty() {
                "<missing>".to_string()
            } else {
                status
            }));
        }
        let Some(jobs) = body
            .get("data")
            .and_then(|d| d.get("jobsList"))
            .and_then(JsonValue::as_object)
        else {
            return Err(AdapterError::Envelope(
                "`data.jobsList` is not an object".to_string(),
            ));
        };

        Ok(jobs
            .iter()
            .filter_map(|(key, raw)| {
                let job = ProviderTwoJob::from_json(raw);
                if job.is_none() {
                    warn!(provider = PROVIDER_TWO, key = %key, "skipping non-object job entry");
                }
                job
            })
            .collect())
    }

    pub fn normalize_job(&self, job: ProviderTwoJob, ctx: &AdapterContext) -> UnifiedListing {
        let external_id = format!("{PROVIDER_TWO}_{}", job.derived_id());
        let location = job.location.unwrap_or_default();
        let compensation = job.compensation;

        UnifiedListing {
            external_id,
            title: text_or(job.position.as_deref(), UNKNOWN_TITLE),
            city: text_or(location.city.as_deref(), UNKNOWN_CITY),
            state: text_or(location.state.as_deref(), UNKNOWN_STATE),
            full_address: format_full_address(&location),
            is_remote: location.remote,
            employment_type: PROVIDER_TWO_EMPLOYMENT_TYPE.to_string(),
            salary_min: compensation.as_ref().and_then(|c| c.min).and_then(positive),
            salary_max: compensation.as_ref().and_then(|c| c.max).and_then(positive),
            salary_currency: compensation
                .as_ref()
                .and_then(|c| non_blank(c.currency.as_deref()))
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            salary_original_range: compensation.as_ref().map(original_range),
            company_name: text_or(job.employer.company_name.as_deref(), UNKNOWN_COMPANY),
            company_industry: None,
            company_website: non_blank(job.employer.website.as_deref()),
            experience_years: job
                .requirements
                .experience
                .and_then(|years| i32::try_from(years).ok()),
            skills: sanitize_skills(&job.requirements.technologies),
            posted_date: parse_posted_date(job.date_posted.as_deref(), ctx.fetched_at),
            provider: PROVIDER_TWO.to_string(),
        }
    }
}

fn format_full_address(location: &ProviderTwoLocation) -> String {
    if location.remote {
        return "Remote".to_string();
    }
    let parts: Vec<String> = [location.city.as_deref(), location.state.as_deref()]
        .into_iter()
        .filter_map(non_blank)
        .collect();
    if parts.is_empty() {
        UNKNOWN_LOCATION.to_string()
    } else {
        parts.join(", ")
    }
}

fn original_range(compensation: &ProviderTwoCompensation) -> String {
    let amount = |v: Option<f64>| v.map(|n| n.to_string()).unwrap_or_default();
    format!(
        "{}-{} {}",
        amount(compensation.min),
        amount(compensation.max),
        compensation.currency.as_deref().unwrap_or_default()
    )
    .trim_end()
    .to_string()
}

#[async_trait]
impl ProviderAdapter for ProviderTwoAdapter {
    type Record = ProviderTwoJob;

    fn provider_id(&self) -> &'static str {
        PROVIDER_TWO
    }

    async fn fetch(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
    ) -> Result<Vec<ProviderTwoJob>, AdapterError> {
        let body = http.fetch_json(ctx.run_id, PROVIDER_TWO, &self.url).await?;
        self.parse_envelope(&body)
    }

    fn normalize(&self, records: Vec<ProviderTwoJob>, ctx: &AdapterContext) -> Vec<UnifiedListing> {
        records
            .into_iter()
            .map(|job| self.normalize_job(job, ctx))
            .collect()
    }
}
