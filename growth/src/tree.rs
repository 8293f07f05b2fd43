use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::types::{INITIAL_HEALTH, Position, Stage};

/// One seven-day growth cycle of an owner.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub id: String,
    pub owner_id: String,
    pub tree_number: u32,
    pub stage: Stage,
    pub health: u32,
    pub day: u32,
    pub planted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_current: bool,
    pub position: Position,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tree {
    /// Plant a fresh current tree: seed stage, initial health, day 1.
    pub fn plant(owner_id: &str, tree_number: u32, position: Position, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            tree_number,
            stage: Stage::Seed,
            health: INITIAL_HEALTH,
            day: 1,
            planted_at: now,
            completed_at: None,
            is_current: true,
            position,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_retired(&self) -> bool {
        !self.is_current && self.completed_at.is_some()
    }
}
