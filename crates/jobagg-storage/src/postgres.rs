//! Postgres-backed [`ListingStore`].

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jobagg_core::{Skill, StoredListing, UnifiedListing};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::store::{ListingStore, StoreError};

const SELECT_LISTING: &str = r#"
    SELECT l.id, l.external_id, l.title, l.city, l.state, l.full_address, l.is_remote,
           l.employment_type,
           l.salary_min::float8 AS salary_min,
           l.salary_max::float8 AS salary_max,
           l.salary_currency, l.salary_original_range, l.company_name, l.company_industry,
           l.company_website, l.experience_years, l.posted_date, l.fetched_date, l.provider,
           ARRAY(
               SELECT s.name
                 FROM listing_skills ls
                 JOIN skills s ON s.id = ls.skill_id
                WHERE ls.listing_id = l.id
                ORDER BY ls.id
           ) AS skills
      FROM job_listings l
     WHERE l.external_id = $1
"#;

#[derive(Debug, Clone)]
pub struct PgListingStore {
    pool: PgPool,
}

impl PgListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .context("applying migrations")
    }
}

fn listing_from_row(row: &PgRow) -> Result<StoredListing, sqlx::Error> {
    Ok(StoredListing {
        id: row.try_get("id")?,
        fetched_date: row.try_get("fetched_date")?,
        listing: UnifiedListing {
            external_id: row.try_get("external_id")?,
            title: row.try_get("title")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            full_address: row.try_get("full_address")?,
            is_remote: row.try_get("is_remote")?,
            employment_type: row.try_get("employment_type")?,
            salary_min: row.try_get("salary_min")?,
            salary_max: row.try_get("salary_max")?,
            salary_currency: row.try_get("salary_currency")?,
            salary_original_range: row.try_get("salary_original_range")?,
            company_name: row.try_get("company_name")?,
            company_industry: row.try_get("company_industry")?,
            company_website: row.try_get("company_website")?,
            experience_years: row.try_get("experience_years")?,
            skills: row.try_get("skills")?,
            posted_date: row.try_get("posted_date")?,
            provider: row.try_get("provider")?,
        },
    })
}

#[async_trait]
impl ListingStore for PgListingStore {
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<StoredListing>, StoreError> {
        let row = sqlx::query(SELECT_LISTING)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(listing_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_skill_by_name(&self, name: &str) -> Result<Option<Skill>, StoreError> {
        let row = sqlx::query("SELECT id, name FROM skills WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(Skill {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_listing(
        &self,
        listing: &UnifiedListing,
        fetched_date: DateTime<Utc>,
    ) -> Result<StoredListing, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO job_listings (
                external_id, title, city, state, full_address, is_remote, employment_type,
                salary_min, salary_max, salary_currency, salary_original_range,
                company_name, company_industry, company_website, experience_years,
                posted_date, fetched_date, provider
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8::numeric, $9::numeric, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18)
            RETURNING id
            "#,
        )
        .bind(&listing.external_id)
        .bind(&listing.title)
        .bind(&listing.city)
        .bind(&listing.state)
        .bind(&listing.full_address)
        .bind(listing.is_remote)
        .bind(&listing.employment_type)
        .bind(listing.salary_min)
        .bind(listing.salary_max)
        .bind(&listing.salary_currency)
        .bind(&listing.salary_original_range)
        .bind(&listing.company_name)
        .bind(&listing.company_industry)
        .bind(&listing.company_website)
        .bind(listing.experience_years)
        .bind(listing.posted_date)
        .bind(fetched_date)
        .bind(&listing.provider)
        .fetch_one(&self.pool)
        .await?;

        Ok(StoredListing {
            id: row.try_get("id")?,
            fetched_date,
            listing: UnifiedListing {
                skills: Vec::new(),
                ..listing.clone()
            },
        })
    }

    async fn insert_skill(&self, name: &str) -> Result<Skill, StoreError> {
        let row = sqlx::query("INSERT INTO skills (name) VALUES ($1) RETURNING id, name")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(Skill {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }

    async fn link_listing_skill(&self, listing_id: i64, skill_id: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO listing_skills (listing_id, skill_id)
            VALUES ($1, $2)
            ON CONFLICT (listing_id, skill_id) DO NOTHING
            "#,
        )
        .bind(listing_id)
        .bind(skill_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
