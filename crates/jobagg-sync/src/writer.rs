use std::sync::Arc;

use chrono::{DateTime, Utc};
use jobagg_core::UnifiedListing;
use jobagg_storage::{ListingStore, StoreError};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::skills::SkillRegistry;
use crate::AggregationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteReport {
    pub stored: usize,
    pub skipped_existing: usize,
    pub failed: usize,
}

enum WriteOutcome {
    Stored,
    Existing,
}

/// Existence-check-then-insert persistence, one listing at a time in batch order.
pub struct ListingWriter {
    store: Arc<dyn ListingStore>,
    skills: SkillRegistry,
}

impl ListingWriter {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        let skills = SkillRegistry::new(store.clone());
        Self { store, skills }
    }

    /// Attempts every listing. A per-listing failure is logged and counted;
    /// only an unreachable store ends the batch early, and listings written
    /// before that point stay written.
    pub async fn store(
        &self,
        listings: &[UnifiedListing],
        fetched_date: DateTime<Utc>,
    ) -> Result<WriteReport, AggregationError> {
        let mut report = WriteReport::default();

        for listing in listings {
            match self.store_one(listing, fetched_date).await {
                Ok(WriteOutcome::Stored) => report.stored += 1,
                Ok(WriteOutcome::Existing) => report.skipped_existing += 1,
                Err(err) if err.is_unavailable() => {
                    error!(
                        external_id = %listing.external_id,
                        stored = report.stored,
                        error = %err,
                        "storage unavailable; aborting write"
                    );
                    return Err(AggregationError::Storage(err));
                }
                Err(err) => {
                    warn!(external_id = %listing.external_id, error = %err, "failed to store listing");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    async fn store_one(
        &self,
        listing: &UnifiedListing,
        fetched_date: DateTime<Utc>,
    ) -> Result<WriteOutcome, StoreError> {
        if self
            .store
            .find_by_external_id(&listing.external_id)
            .await?
            .is_some()
        {
            debug!(external_id = %listing.external_id, "listing already stored; skipping");
            return Ok(WriteOutcome::Existing);
        }

        let stored = self.store.insert_listing(listing, fetched_date).await?;
        for name in listing.skills.iter().filter(|n| !n.trim().is_empty()) {
            let skill = self.skills.resolve(name).await?;
            self.store.link_listing_skill(stored.id, skill.id).await?;
        }
        debug!(
            external_id = %listing.external_id,
            listing_id = stored.id,
            skills = listing.skills.len(),
            "stored listing"
        );
        Ok(WriteOutcome::Stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use jobagg_core::{Skill, StoredListing};
    use jobagg_storage::MemoryListingStore;

    /// Memory store that fails inserts for chosen external ids.
    struct FlakyStore {
        inner: MemoryListingStore,
        conflict_on: Option<&'static str>,
        outage_on: Option<&'static str>,
    }

    #[async_trait]
    impl ListingStore for FlakyStore {
        async fn find_by_external_id(
            &self,
            external_id: &str,
        ) -> Result<Option<StoredListing>, StoreError> {
            self.inner.find_by_external_id(external_id).await
        }

        async fn find_skill_by_name(&self, name: &str) -> Result<Option<Skill>, StoreError> {
            self.inner.find_skill_by_name(name).await
        }

        async fn insert_listing(
            &self,
            listing: &UnifiedListing,
            fetched_date: DateTime<Utc>,
        ) -> Result<StoredListing, StoreError> {
            if self.outage_on == Some(listing.external_id.as_str()) {
                return Err(StoreError::Unavailable("connection reset".into()));
            }
            if self.conflict_on == Some(listing.external_id.as_str()) {
                return Err(StoreError::Conflict("job_listings_external_id_key".into()));
            }
            self.inner.insert_listing(listing, fetched_date).await
        }

        async fn insert_skill(&self, name: &str) -> Result<Skill, StoreError> {
            self.inner.insert_skill(name).await
        }

        async fn link_listing_skill(&self, listing_id: i64, skill_id: i64) -> Result<(), StoreError> {
            self.inner.link_listing_skill(listing_id, skill_id).await
        }
    }

    fn listing(external_id: &str, skills: &[&str]) -> UnifiedListing {
        UnifiedListing {
            external_id: external_id.to_string(),
            title: "QA Engineer".into(),
            city: "Boston".into(),
            state: "MA".into(),
            full_address: "Boston, MA".into(),
            is_remote: false,
            employment_type: "Full-Time".into(),
            salary_min: Some(70_000.0),
            salary_max: Some(90_000.0),
            salary_currency: "USD".into(),
            salary_original_range: Some("$70k - $90k".into()),
            company_name: "Hooli".into(),
            company_industry: Some("Technology".into()),
            company_website: None,
            experience_years: None,
            skills: skills.iter().map(ToString::to_string).collect(),
            posted_date: Utc.with_ymd_and_hms(2026, 3, 20, 0, 0, 0).single().unwrap(),
            provider: "provider1".into(),
        }
    }

    fn batch() -> Vec<UnifiedListing> {
        vec![
            listing("provider1_a", &["Go", "SQL"]),
            listing("provider1_b", &["Rust"]),
            listing("provider1_c", &["SQL", "Kafka"]),
        ]
    }

    #[tokio::test]
    async fn existing_listings_are_skipped_not_updated() {
        let store = Arc::new(MemoryListingStore::new());
        let writer = ListingWriter::new(store.clone());
        let now = Utc::now();

        let first = writer.store(&batch(), now).await.unwrap();
        assert_eq!(first, WriteReport { stored: 3, skipped_existing: 0, failed: 0 });

        let mut changed = batch();
        changed[0].title = "Senior QA Engineer".into();
        let second = writer.store(&changed, now).await.unwrap();
        assert_eq!(second, WriteReport { stored: 0, skipped_existing: 3, failed: 0 });

        let kept = store.find_by_external_id("provider1_a").await.unwrap().unwrap();
        assert_eq!(kept.listing.title, "QA Engineer");
        assert_eq!(kept.listing.skills, vec!["Go", "SQL"]);
        assert_eq!(store.skills().await.len(), 4);
    }

    #[tokio::test]
    async fn per_listing_failure_does_not_stop_the_batch() {
        let store = Arc::new(FlakyStore {
            inner: MemoryListingStore::new(),
            conflict_on: Some("provider1_b"),
            outage_on: None,
        });
        let writer = ListingWriter::new(store.clone());

        let report = writer.store(&batch(), Utc::now()).await.unwrap();
        assert_eq!(report, WriteReport { stored: 2, skipped_existing: 0, failed: 1 });

        let ids: Vec<_> = store
            .inner
            .listings()
            .await
            .into_iter()
            .map(|l| l.listing.external_id)
            .collect();
        assert_eq!(ids, vec!["provider1_a", "provider1_c"]);
    }

    #[tokio::test]
    async fn blank_skill_names_are_skipped() {
        let store = Arc::new(MemoryListingStore::new());
        let writer = ListingWriter::new(store.clone());
        let batch = vec![listing("provider1_x", &["Go", "", "  "]), listing("provider1_y", &["Go"])];

        let report = writer.store(&batch, Utc::now()).await.unwrap();
        assert_eq!(report, WriteReport { stored: 2, skipped_existing: 0, failed: 0 });

        let stored = store.find_by_external_id("provider1_x").await.unwrap().unwrap();
        assert_eq!(stored.listing.skills, vec!["Go"]);
        assert_eq!(store.skills().await.len(), 1);

        let again = writer.store(&batch, Utc::now()).await.unwrap();
        assert_eq!(again, WriteReport { stored: 0, skipped_existing: 2, failed: 0 });
    }

    #[tokio::test]
    async fn outage_aborts_and_keeps_earlier_writes() {
        let store = Arc::new(FlakyStore {
            inner: MemoryListingStore::new(),
            conflict_on: None,
            outage_on: Some("provider1_b"),
        });
        let writer = ListingWriter::new(store.clone());

        let err = writer.store(&batch(), Utc::now()).await.unwrap_err();
        assert!(matches!(err, AggregationError::Storage(StoreError::Unavailable(_))));

        let stored = store.inner.listings().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].listing.external_id, "provider1_a");
    }
}
