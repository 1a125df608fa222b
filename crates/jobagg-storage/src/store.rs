use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobagg_core::{Skill, StoredListing, UnifiedListing};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend cannot be reached at all. Callers abort the current run.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Query(sqlx::Error),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => return StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                return StoreError::Conflict(db.message().to_string())
            }
            _ => {}
        }
        StoreError::Query(err)
    }
}

/// Existence-check and insert operations the writer needs from durable storage.
/// Listings are never updated once inserted.
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StoredListing>, StoreError>;

    async fn find_skill_by_name(&self, name: &str) -> Result<Option<Skill>, StoreError>;

    /// Persist `listing` without its skills; those are attached afterwards
    /// with [`ListingStore::link_listing_skill`].
    async fn insert_listing(
        &self,
        listing: &UnifiedListing,
        fetched_date: DateTime<Utc>,
    ) -> Result<StoredListing, StoreError>;

    async fn insert_skill(&self, name: &str) -> Result<Skill, StoreError>;

    async fn link_listing_skill(&self, listing_id: i64, skill_id: i64) -> Result<(), StoreError>;
}
