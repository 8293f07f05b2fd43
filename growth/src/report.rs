//! Owner-level statistics and forest consistency checks.

use serde::Serialize;
use tracing::{instrument, warn};

use crate::core::invariants::validate_forest;
use crate::error::GrowthError;
use crate::io::store::Gateway;
use crate::stats::{HabitAggregates, TreeAggregates, UserStats};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestStats {
    pub user_stats: UserStats,
    pub tree_stats: TreeAggregates,
    pub habit_stats: HabitAggregates,
}

/// Stats for `owner_id`. Fails with `StatsNotFound` until the owner has planted a tree.
#[instrument(skip_all, fields(owner = owner_id))]
pub fn stats<G: Gateway>(store: &G, owner_id: &str) -> Result<ForestStats, GrowthError> {
    store.transaction(|uow| {
        let user_stats = uow
            .load_user_stats(owner_id)?
            .ok_or(GrowthError::StatsNotFound)?;
        Ok(ForestStats {
            user_stats,
            tree_stats: uow.tree_aggregates(owner_id)?,
            habit_stats: uow.habit_aggregates(owner_id)?,
        })
    })
}

/// Violations found in the owner's stored forest; empty when consistent.
#[instrument(skip_all, fields(owner = owner_id))]
pub fn check_forest<G: Gateway>(store: &G, owner_id: &str) -> Result<Vec<String>, GrowthError> {
    let (trees, records) =
        store.transaction(|uow| Ok((uow.list_trees(owner_id)?, uow.habit_records(owner_id)?)))?;
    let errors = validate_forest(&trees, &records);
    if !errors.is_empty() {
        warn!(count = errors.len(), "forest invariants violated");
    }
    Ok(errors)
}
