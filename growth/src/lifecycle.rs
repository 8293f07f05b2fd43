//! Orchestration for planting, reading and completing trees.
//!
//! Retiring a tree and planting its successor happen in one transaction, so
//! an owner never observes zero or two current trees.

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::core::completion::{initial_tree, plan_completion, roll_day};
use crate::core::tally::{StatsEvent, apply_stats_event};
use crate::error::GrowthError;
use crate::io::clock::Clock;
use crate::io::store::Gateway;
use crate::tree::Tree;

/// Outcome of a completion: the retired tree and the freshly planted one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub completed_tree: Tree,
    pub new_tree: Tree,
}

/// Current tree of `owner_id`, with its day rolled forward if time has passed.
#[instrument(skip_all, fields(owner = owner_id))]
pub fn get_current_tree<G, C>(store: &G, clock: &C, owner_id: &str) -> Result<Tree, GrowthError>
where
    G: Gateway,
    C: Clock + ?Sized,
{
    let now = clock.now();
    store.transaction(|uow| {
        let tree = uow
            .find_current_tree(owner_id)?
            .ok_or(GrowthError::NoCurrentTree)?;
        match roll_day(&tree, now) {
            Some(rolled) => {
                debug!(tree_id = %rolled.id, from = tree.day, to = rolled.day, "day rollover");
                uow.update_tree(&rolled)?;
                Ok(rolled)
            }
            None => Ok(tree),
        }
    })
}

/// Result of a plant request: the owner's current tree, and whether this call planted it.
#[derive(Debug, Clone, PartialEq)]
pub struct Planting {
    pub tree: Tree,
    pub planted: bool,
}

/// Plant the owner's first (or next) tree if they have no current one.
///
/// Returns the existing current tree unchanged when there already is one.
pub fn create_initial_tree<G, C>(
    store: &G,
    clock: &C,
    forest_radius: f64,
    owner_id: &str,
) -> Result<Tree, GrowthError>
where
    G: Gateway,
    C: Clock + ?Sized,
{
    plant_tree(store, clock, forest_radius, owner_id).map(|planting| planting.tree)
}

/// Like [`create_initial_tree`], but tells apart a new tree from an existing one.
#[instrument(skip_all, fields(owner = owner_id))]
pub fn plant_tree<G, C>(
    store: &G,
    clock: &C,
    forest_radius: f64,
    owner_id: &str,
) -> Result<Planting, GrowthError>
where
    G: Gateway,
    C: Clock + ?Sized,
{
    let now = clock.now();
    store.transaction(|uow| {
        if let Some(existing) = uow.find_current_tree(owner_id)? {
            debug!(tree_id = %existing.id, "owner already has a current tree");
            return Ok(Planting {
                tree: existing,
                planted: false,
            });
        }
        let prior = uow.count_trees(owner_id)?;
        let tree = initial_tree(owner_id, prior, forest_radius, now);
        uow.insert_tree(&tree)?;
        uow.ensure_user_stats(owner_id)?;
        info!(tree_id = %tree.id, tree_number = tree.tree_number, "tree planted");
        Ok(Planting {
            tree,
            planted: true,
        })
    })
}

/// Retire the owner's current tree once it reaches day 7 and plant the next one.
#[instrument(skip_all, fields(owner = owner_id, tree = tree_id))]
pub fn complete_if_ready<G, C>(
    store: &G,
    clock: &C,
    forest_radius: f64,
    owner_id: &str,
    tree_id: &str,
) -> Result<Completion, GrowthError>
where
    G: Gateway,
    C: Clock + ?Sized,
{
    let now = clock.now();
    let completion = store.transaction(|uow| {
        let tree = uow
            .find_tree(owner_id, tree_id)?
            .filter(|tree| tree.is_current)
            .ok_or(GrowthError::TreeNotFound)?;
        let plan = plan_completion(&tree, forest_radius, now)?;

        // retire first: the partial unique index allows one current tree per owner
        uow.update_tree(&plan.retired)?;
        uow.insert_tree(&plan.successor)?;

        let mut stats = uow.ensure_user_stats(owner_id)?;
        apply_stats_event(&mut stats, StatsEvent::TreeCompleted);
        uow.save_user_stats(&stats)?;

        Ok(Completion {
            completed_tree: plan.retired,
            new_tree: plan.successor,
        })
    })?;

    info!(
        completed = completion.completed_tree.tree_number,
        stage = %completion.completed_tree.stage,
        new_tree = %completion.new_tree.id,
        "tree completed"
    );
    Ok(completion)
}

/// All of the owner's trees, oldest first.
pub fn list_trees<G: Gateway>(store: &G, owner_id: &str) -> Result<Vec<Tree>, GrowthError> {
    store.transaction(|uow| uow.list_trees(owner_id))
}
