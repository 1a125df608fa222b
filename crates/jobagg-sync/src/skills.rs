use std::sync::Arc;

use jobagg_core::Skill;
use jobagg_storage::{ListingStore, StoreError};
use tracing::debug;

/// Find-or-create over the `skills` table, keyed by the trimmed name.
/// Matching is otherwise exact: "Go" and "GO" are different skills.
#[derive(Clone)]
pub struct SkillRegistry {
    store: Arc<dyn ListingStore>,
}

impl SkillRegistry {
    pub fn new(store: Arc<dyn ListingStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, name: &str) -> Result<Skill, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Rejected("empty skill name".to_string()));
        }
        if let Some(skill) = self.store.find_skill_by_name(name).await? {
            return Ok(skill);
        }

        match self.store.insert_skill(name).await {
            Ok(skill) => {
                debug!(skill = %skill.name, skill_id = skill.id, "created skill");
                Ok(skill)
            }
            // Another writer created it between our lookup and insert.
            Err(StoreError::Conflict(reason)) => self
                .store
                .find_skill_by_name(name)
                .await?
                .ok_or(StoreError::Conflict(reason)),
            Err(err) => Err(err),
        }
    }
}
