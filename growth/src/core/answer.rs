//! Habit answer transition: slot bookkeeping, health, stage and day.

use chrono::{DateTime, Utc};

use crate::core::day::{day_number, stored_day};
use crate::core::growth::{apply_health_delta, stage_of};
use crate::core::types::{Answer, QUESTIONS_PER_DAY, Question};
use crate::error::GrowthError;
use crate::habit::HabitRecord;
use crate::tree::Tree;

/// New tree and habit record state after a successful answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerTransition {
    pub tree: Tree,
    pub record: HabitRecord,
    pub remaining_questions: u32,
    pub health_change: i32,
}

/// Apply one answer to `tree` and today's `record`.
///
/// The inputs are left untouched; the caller persists the returned state.
/// Ownership of the tree must already have been checked by the caller.
pub fn record_answer(
    tree: &Tree,
    record: &HabitRecord,
    question: Question,
    answer: Answer,
    now: DateTime<Utc>,
) -> Result<AnswerTransition, GrowthError> {
    if !tree.is_current || record.tree_id != tree.id || record.owner_id != tree.owner_id {
        return Err(GrowthError::TreeNotFound);
    }
    if record.slots.get(question).is_some() {
        return Err(GrowthError::AlreadyAnswered(question));
    }
    if record.slots.answered_count() >= QUESTIONS_PER_DAY {
        return Err(GrowthError::DailyLimitReached);
    }

    let mut next_record = record.clone();
    next_record.slots.fill(question, answer);
    next_record.total_positive = next_record.slots.positive_count();
    next_record.updated_at = now;

    let health_change = answer.health_delta();
    let mut next_tree = tree.clone();
    next_tree.health = apply_health_delta(tree.health, health_change);
    next_tree.stage = stage_of(next_tree.health);
    next_tree.day = stored_day(day_number(tree.planted_at, now));
    next_tree.updated_at = now;

    Ok(AnswerTransition {
        remaining_questions: next_record.remaining_questions(),
        tree: next_tree,
        record: next_record,
        health_change,
    })
}
