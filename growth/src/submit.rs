//! Orchestration for recording one habit answer.

use serde::Serialize;
use tracing::{info, instrument};

use crate::core::answer::record_answer;
use crate::core::tally::{StatsEvent, apply_stats_event};
use crate::core::types::{Answer, Question};
use crate::error::GrowthError;
use crate::habit::HabitRecord;
use crate::io::clock::Clock;
use crate::io::store::Gateway;
use crate::tree::Tree;

/// Result of a successful answer, as returned to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub tree: Tree,
    pub habit_record: HabitRecord,
    pub remaining_questions: u32,
    pub health_change: i32,
}

/// Record `question` for today on the owner's current tree.
///
/// In one transaction: fetch-or-create today's habit record, apply the
/// answer, persist tree and record, and bump the owner's stats.
#[instrument(skip_all, fields(owner = owner_id, tree = tree_id, question = %question))]
pub fn submit_answer<G, C>(
    store: &G,
    clock: &C,
    owner_id: &str,
    tree_id: &str,
    question: Question,
    is_positive: bool,
) -> Result<AnswerOutcome, GrowthError>
where
    G: Gateway,
    C: Clock + ?Sized,
{
    let now = clock.now();
    let today = now.date_naive();
    let answer = Answer::from_bool(is_positive);

    let outcome = store.transaction(|uow| {
        let tree = uow
            .find_tree(owner_id, tree_id)?
            .filter(|tree| tree.is_current)
            .ok_or(GrowthError::TreeNotFound)?;

        let record =
            uow.insert_or_fetch_habit_record(&HabitRecord::empty(owner_id, tree_id, today, now))?;
        let transition = record_answer(&tree, &record, question, answer, now)?;

        uow.update_tree(&transition.tree)?;
        uow.update_habit_record(&transition.record)?;

        let mut stats = uow.ensure_user_stats(owner_id)?;
        apply_stats_event(&mut stats, StatsEvent::Answered { answer, date: today });
        uow.save_user_stats(&stats)?;

        Ok(AnswerOutcome {
            tree: transition.tree,
            habit_record: transition.record,
            remaining_questions: transition.remaining_questions,
            health_change: transition.health_change,
        })
    })?;

    info!(
        health = outcome.tree.health,
        stage = %outcome.tree.stage,
        remaining = outcome.remaining_questions,
        "habit answer recorded"
    );
    Ok(outcome)
}
