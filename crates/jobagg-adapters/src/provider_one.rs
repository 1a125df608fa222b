use async_trait::async_trait;
use jobagg_core::{
    UnifiedListing, DEFAULT_CURRENCY, PROVIDER_ONE, UNKNOWN_COMPANY, UNKNOWN_LOCATION,
    UNKNOWN_TITLE, UNKNOWN_TYPE,
};
use jobagg_storage::HttpFetcher;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::parse::{
    is_remote_location, non_blank, parse_location, parse_posted_date, parse_salary_range,
    sanitize_skills, text_or, SalaryParse,
};
use crate::{json_array, json_str, json_text, AdapterContext, AdapterError, ProviderAdapter};

/// Provider 1 envelope: `{ "metadata": {..}, "jobs": [ job, .. ] }`.
#[derive(Debug, Clone)]
pub struct ProviderOneAdapter {
    url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderOneJob {
    pub job_id: String,
    pub title: Option<String>,
    pub details: ProviderOneDetails,
    pub company: ProviderOneCompany,
    pub skills: Vec<JsonValue>,
    pub posted_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderOneDetails {
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub salary_range: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderOneCompany {
    pub name: Option<String>,
    pub industry: Option<String>,
}

impl ProviderOneJob {
    /// Lenient field extraction. Only a missing `jobId` rejects the record,
    /// since without it the listing has no identity.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        let job_id = non_blank(json_text(value, &["jobId"]).as_deref())?;
        Some(Self {
            job_id,
            title: json_str(value, &["title"]),
            details: ProviderOneDetails {
                location: json_str(value, &["details", "location"]),
                employment_type: json_str(value, &["details", "type"]),
                salary_range: json_str(value, &["details", "salaryRange"]),
            },
            company: ProviderOneCompany {
                name: json_str(value, &["company", "name"]),
                industry: json_str(value, &["company", "industry"]),
            },
            skills: json_array(value, &["skills"]),
            posted_date: json_str(value, &["postedDate"]),
        })
    }
}

impl ProviderOneAdapter {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn parse_envelope(&self, body: &JsonValue) -> Result<Vec<ProviderOneJob>, AdapterError> {
        if !body.is_object() {
            return Err(AdapterError::Envelope("expected a JSON object".to_string()));
        }
        let jobs = match body.get("jobs") {
            None | Some(JsonValue::Null) => return Ok(Vec::new()),
            Some(JsonValue::Array(jobs)) => jobs,
            Some(_) => return Err(AdapterError::Envelope("`jobs` is not an array".to_string())),
        };

        Ok(jobs
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| {
                let job = ProviderOneJob::from_json(raw);
                if job.is_none() {
                    warn!(provider = PROVIDER_ONE, index, "skipping job without jobId");
                }
                job
            })
            .collect())
    }

    pub fn normalize_job(&self, job: ProviderOneJob, ctx: &AdapterContext) -> UnifiedListing {
        let location_text = job.details.location.as_deref().unwrap_or_default();
        let is_remote = is_remote_location(location_text);
        let mut location = parse_location(location_text);
        if is_remote {
            location = location.without_remote_markers();
        }
        let (salary_min, salary_max, salary_currency) = job
            .details
            .salary_range
            .as_deref()
            .map(parse_salary_range)
            .map(SalaryParse::into_bounds)
            .unwrap_or_else(|| (None, None, DEFAULT_CURRENCY.to_string()));

        UnifiedListing {
            external_id: format!("{PROVIDER_ONE}_{}", job.job_id),
            title: text_or(job.title.as_deref(), UNKNOWN_TITLE),
            city: location.city,
            state: location.state,
            full_address: text_or(job.details.location.as_deref(), UNKNOWN_LOCATION),
            is_remote,
            employment_type: text_or(job.details.employment_type.as_deref(), UNKNOWN_TYPE),
            salary_min,
            salary_max,
            salary_currency,
            salary_original_range: job
                .details
                .salary_range
                .filter(|raw| !raw.trim().is_empty()),
            company_name: text_or(job.company.name.as_deref(), UNKNOWN_COMPANY),
            company_industry: non_blank(job.company.industry.as_deref()),
            company_website: None,
            experience_years: None,
            skills: sanitize_skills(&job.skills),
            posted_date: parse_posted_date(job.posted_date.as_deref(), ctx.fetched_at),
            provider: PROVIDER_ONE.to_string(),
        }
    }
}

#[async_trait]
impl ProviderAdapter for ProviderOneAdapter {
    type Record = ProviderOneJob;

    fn provider_id(&self) -> &'static str {
        PROVIDER_ONE
    }

    async fn fetch(
        &self,
        http: &HttpFetcher,
        ctx: &AdapterContext,
    ) -> Result<Vec<ProviderOneJob>, AdapterError> {
        let body = http.fetch_json(ctx.run_id, PROVIDER_ONE, &self.url).await?;
        self.parse_envelope(&body)
    }

    fn normalize(&self, records: Vec<ProviderOneJob>, ctx: &AdapterContext) -> Vec<UnifiedListing> {
        records
            .into_iter()
            .map(|job| self.normalize_job(job, ctx))
            .collect()
    }
}
