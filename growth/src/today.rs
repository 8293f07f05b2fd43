//! Read models for a tree's habit records.

use serde::Serialize;
use tracing::instrument;

use crate::core::types::QUESTIONS_PER_DAY;
use crate::error::GrowthError;
use crate::habit::HabitRecord;
use crate::io::clock::Clock;
use crate::io::store::Gateway;

/// Default page size for [`history`].
pub const DEFAULT_HISTORY_LIMIT: u32 = 30;

/// Today's progress on one tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayHabits {
    pub habit_record: Option<HabitRecord>,
    pub answered_count: u32,
    pub remaining_questions: u32,
    pub is_complete: bool,
}

impl TodayHabits {
    fn from_record(record: Option<HabitRecord>) -> Self {
        let answered_count = record
            .as_ref()
            .map_or(0, |record| record.slots.answered_count());
        Self {
            habit_record: record,
            answered_count,
            remaining_questions: QUESTIONS_PER_DAY.saturating_sub(answered_count),
            is_complete: answered_count == QUESTIONS_PER_DAY,
        }
    }
}

/// Today's record for `tree_id`, which may be current or retired but must belong to the owner.
#[instrument(skip_all, fields(owner = owner_id, tree = tree_id))]
pub fn today<G, C>(
    store: &G,
    clock: &C,
    owner_id: &str,
    tree_id: &str,
) -> Result<TodayHabits, GrowthError>
where
    G: Gateway,
    C: Clock + ?Sized,
{
    let date = clock.now().date_naive();
    store.transaction(|uow| {
        uow.find_tree(owner_id, tree_id)?
            .ok_or(GrowthError::TreeNotFound)?;
        let record = uow.find_habit_record(owner_id, tree_id, date)?;
        Ok(TodayHabits::from_record(record))
    })
}

/// Past records of `tree_id`, newest first.
#[instrument(skip_all, fields(owner = owner_id, tree = tree_id, limit = limit, offset = offset))]
pub fn history<G: Gateway>(
    store: &G,
    owner_id: &str,
    tree_id: &str,
    limit: u32,
    offset: u32,
) -> Result<Vec<HabitRecord>, GrowthError> {
    store.transaction(|uow| {
        uow.find_tree(owner_id, tree_id)?
            .ok_or(GrowthError::TreeNotFound)?;
        uow.habit_history(owner_id, tree_id, limit, offset)
    })
}
