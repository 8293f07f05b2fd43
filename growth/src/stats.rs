//! Aggregate per-owner counters and read-side aggregates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Running totals for one owner, mutated alongside every answer and completion.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub owner_id: String,
    pub total_trees_completed: u32,
    pub total_positive_answers: u32,
    pub total_negative_answers: u32,
    /// Consecutive calendar days with at least one answer, ending at `last_activity_date`.
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
}

impl UserStats {
    pub fn new(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            ..Self::default()
        }
    }
}

/// Health summary across all of an owner's trees.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TreeAggregates {
    pub total_trees: u32,
    pub average_health: Option<f64>,
    pub best_health: Option<u32>,
    pub worst_health: Option<u32>,
}

/// Answer summary across all of an owner's habit records.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HabitAggregates {
    pub days_recorded: u32,
    pub total_positive: u32,
    pub average_daily_positive: Option<f64>,
}
