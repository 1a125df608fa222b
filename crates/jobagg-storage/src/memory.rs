//! In-process [`ListingStore`] for tests and dry runs. Enforces the same
//! uniqueness rules as the Postgres schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobagg_core::{Skill, StoredListing, UnifiedListing};
use tokio::sync::Mutex;

use crate::store::{ListingStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryListingStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    listings: Vec<StoredListing>,
    skills: Vec<Skill>,
    links: Vec<(i64, i64)>,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn listings(&self) -> Vec<StoredListing> {
        self.state.lock().await.listings.clone()
    }

    pub async fn skills(&self) -> Vec<Skill> {
        self.state.lock().await.skills.clone()
    }

    pub async fn links(&self) -> Vec<(i64, i64)> {
        self.state.lock().await.links.clone()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StoredListing>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .listings
            .iter()
            .find(|l| l.listing.external_id == external_id)
            .cloned())
    }

    async fn find_skill_by_name(&self, name: &str) -> Result<Option<Skill>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.skills.iter().find(|s| s.name == name).cloned())
    }

    async fn insert_listing(
        &self,
        listing: &UnifiedListing,
        fetched_date: DateTime<Utc>,
    ) -> Result<StoredListing, StoreError> {
        let mut state = self.state.lock().await;
        if state
            .listings
            .iter()
            .any(|l| l.listing.external_id == listing.external_id)
        {
            return Err(StoreError::Conflict(format!(
                "job_listings.external_id={}",
                listing.external_id
            )));
        }
        let stored = StoredListing {
            id: state.listings.len() as i64 + 1,
            fetched_date,
            listing: UnifiedListing {
                skills: Vec::new(),
                ..listing.clone()
            },
        };
        state.listings.push(stored.clone());
        Ok(stored)
    }

    async fn insert_skill(&self, name: &str) -> Result<Skill, StoreError> {
        let mut state = self.state.lock().await;
        if state.skills.iter().any(|s| s.name == name) {
            return Err(StoreError::Conflict(format!("skills.name={name}")));
        }
        let skill = Skill {
            id: state.skills.len() as i64 + 1,
            name: name.to_string(),
        };
        state.skills.push(skill.clone());
        Ok(skill)
    }

    async fn link_listing_skill(&self, listing_id: i64, skill_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let Some(skill_name) = state
            .skills
            .iter()
            .find(|s| s.id == skill_id)
            .map(|s| s.name.clone())
        else {
            return Err(StoreError::Rejected(format!("unknown skill id {skill_id}")));
        };
        if state.links.contains(&(listing_id, skill_id)) {
            return Ok(());
        }
        let Some(listing) = state.listings.iter_mut().find(|l| l.id == listing_id) else {
            return Err(StoreError::Rejected(format!("unknown listing id {listing_id}")));
        };
        listing.listing.skills.push(skill_name);
        state.links.push((listing_id, skill_id));
        Ok(())
    }
}
