//! Tree lifecycle: initial planting, day rollover and completion.

use chrono::{DateTime, Utc};

use crate::core::day::{day_number, is_ready_to_complete, stored_day};
use crate::core::placement::golden_angle_position;
use crate::core::types::Position;
use crate::error::GrowthError;
use crate::tree::Tree;

/// Retired tree plus its successor; both must be persisted together.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionPlan {
    pub retired: Tree,
    pub successor: Tree,
}

/// First tree for an owner with `prior_trees` retired trees.
pub fn initial_tree(owner_id: &str, prior_trees: u32, radius: f64, now: DateTime<Utc>) -> Tree {
    Tree::plant(
        owner_id,
        prior_trees + 1,
        golden_angle_position(prior_trees, radius),
        now,
    )
}

/// Recompute the stored day. Returns `None` if it did not change.
pub fn roll_day(tree: &Tree, now: DateTime<Utc>) -> Option<Tree> {
    if !tree.is_current {
        return None;
    }
    let day = stored_day(day_number(tree.planted_at, now));
    if day == tree.day {
        return None;
    }
    let mut next = tree.clone();
    next.day = day;
    next.updated_at = now;
    Some(next)
}

/// Retire `tree` into the forest and plant its successor at the center.
///
/// Fails with [`GrowthError::TreeNotReady`] before day 7, regardless of the
/// stored `day` field; elapsed time since planting is authoritative.
pub fn plan_completion(
    tree: &Tree,
    radius: f64,
    now: DateTime<Utc>,
) -> Result<CompletionPlan, GrowthError> {
    if !tree.is_current {
        return Err(GrowthError::TreeNotFound);
    }
    let day = day_number(tree.planted_at, now);
    if !is_ready_to_complete(day) {
        return Err(GrowthError::TreeNotReady { day });
    }

    let mut retired = tree.clone();
    retired.position = golden_angle_position(tree.tree_number.saturating_sub(1), radius);
    retired.is_current = false;
    retired.completed_at = Some(now);
    retired.day = stored_day(day);
    retired.updated_at = now;

    let successor = Tree::plant(&tree.owner_id, tree.tree_number + 1, Position::CENTER, now);

    Ok(CompletionPlan { retired, successor })
}
