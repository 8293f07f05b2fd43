//! Forest invariants that the schema alone cannot express.

use std::collections::HashSet;

use crate::core::growth::stage_of;
use crate::core::types::{DAYS_PER_TREE, INITIAL_HEALTH, MAX_HEALTH, Stage};
use crate::habit::HabitRecord;
use crate::tree::Tree;

/// Check one owner's trees and habit records:
/// - At most one current tree
/// - Health within range, stored day within `1..=7`
/// - Current tree stage matches its health (a never-answered seed is exempt)
/// - `completed_at` set iff the tree is retired
/// - Unique tree numbers
/// - `total_positive` equals the positive slot count; one record per tree and date
pub fn validate_forest(trees: &[Tree], records: &[HabitRecord]) -> Vec<String> {
    let mut errors = Vec::new();

    let current = trees.iter().filter(|tree| tree.is_current).count();
    if current > 1 {
        errors.push(format!("{} current trees (expected at most 1)", current));
    }

    let answered: HashSet<&str> = records
        .iter()
        .filter(|record| record.slots.answered_count() > 0)
        .map(|record| record.tree_id.as_str())
        .collect();

    let mut numbers = HashSet::new();
    for tree in trees {
        validate_tree(tree, answered.contains(tree.id.as_str()), &mut errors);
        if !numbers.insert(tree.tree_number) {
            errors.push(format!("duplicate tree_number {}", tree.tree_number));
        }
    }

    let mut days = HashSet::new();
    for record in records {
        if record.total_positive != record.slots.positive_count() {
            errors.push(format!(
                "habit {}: total_positive {} but {} positive slots",
                record.id,
                record.total_positive,
                record.slots.positive_count()
            ));
        }
        if !days.insert((record.tree_id.as_str(), record.date)) {
            errors.push(format!(
                "tree {}: more than one habit record for {}",
                record.tree_id, record.date
            ));
        }
    }

    errors
}

fn validate_tree(tree: &Tree, has_answers: bool, errors: &mut Vec<String>) {
    let label = format!("tree #{}", tree.tree_number);

    if tree.health > MAX_HEALTH {
        errors.push(format!("{}: health {} exceeds {}", label, tree.health, MAX_HEALTH));
    }
    if tree.day == 0 || tree.day > DAYS_PER_TREE {
        errors.push(format!("{}: day {} outside 1..={}", label, tree.day, DAYS_PER_TREE));
    }
    // a freshly planted tree is a seed at initial health until its first answer
    let unanswered = !has_answers && tree.stage == Stage::Seed && tree.health == INITIAL_HEALTH;
    if tree.is_current && !unanswered && tree.stage != stage_of(tree.health) {
        errors.push(format!(
            "{}: stage {} does not match health {}",
            label, tree.stage, tree.health
        ));
    }
    if tree.is_current == tree.completed_at.is_some() {
        errors.push(format!(
            "{}: is_current={} but completed_at is {}",
            label,
            tree.is_current,
            if tree.completed_at.is_some() { "set" } else { "unset" }
        ));
    }
}
