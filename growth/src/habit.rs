//! Per-day answer ledger for one tree.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::types::{Answer, QUESTIONS_PER_DAY, Question};

/// The four answer slots of a day. A slot, once set, is never overwritten.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitSlots {
    pub mood: Option<Answer>,
    pub food: Option<Answer>,
    pub hydration: Option<Answer>,
    pub sleep: Option<Answer>,
}

impl HabitSlots {
    pub fn get(&self, question: Question) -> Option<Answer> {
        match question {
            Question::Mood => self.mood,
            Question::Food => self.food,
            Question::Hydration => self.hydration,
            Question::Sleep => self.sleep,
        }
    }

    fn slot_mut(&mut self, question: Question) -> &mut Option<Answer> {
        match question {
            Question::Mood => &mut self.mood,
            Question::Food => &mut self.food,
            Question::Hydration => &mut self.hydration,
            Question::Sleep => &mut self.sleep,
        }
    }

    /// Fill an empty slot. Returns false (and leaves the slot alone) if it was
    /// already answered.
    pub fn fill(&mut self, question: Question, answer: Answer) -> bool {
        let slot = self.slot_mut(question);
        if slot.is_some() {
            return false;
        }
        *slot = Some(answer);
        true
    }

    pub fn answered_count(&self) -> u32 {
        Question::ALL
            .into_iter()
            .filter(|question| self.get(*question).is_some())
            .count() as u32
    }

    pub fn positive_count(&self) -> u32 {
        Question::ALL
            .into_iter()
            .filter(|question| self.get(*question) == Some(Answer::Positive))
            .count() as u32
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HabitRecord {
    pub id: String,
    pub owner_id: String,
    pub tree_id: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub slots: HabitSlots,
    pub total_positive: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HabitRecord {
    /// Empty record for `date`; used as the insert half of insert-or-fetch.
    pub fn empty(owner_id: &str, tree_id: &str, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            tree_id: tree_id.to_string(),
            date,
            slots: HabitSlots::default(),
            total_positive: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn remaining_questions(&self) -> u32 {
        QUESTIONS_PER_DAY.saturating_sub(self.slots.answered_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_refuses_to_overwrite() {
        let mut slots = HabitSlots::default();
        assert!(slots.fill(Question::Mood, Answer::Negative));
        assert!(!slots.fill(Question::Mood, Answer::Positive));
        assert_eq!(slots.mood, Some(Answer::Negative));
    }

    #[test]
    fn counts_follow_slot_values() {
        let slots = HabitSlots {
            mood: Some(Answer::Positive),
            food: None,
            hydration: Some(Answer::Negative),
            sleep: Some(Answer::Positive),
        };
        assert_eq!(slots.answered_count(), 3);
        assert_eq!(slots.positive_count(), 2);
    }

    #[test]
    fn record_serializes_slots_inline() {
        let now = DateTime::<Utc>::from_timestamp(0, 0).expect("epoch");
        let mut record = HabitRecord::empty("owner", "tree", now.date_naive(), now);
        record.slots.fill(Question::Food, Answer::Positive);
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["food"], "positive");
        assert!(value["mood"].is_null());
        assert_eq!(value["treeId"], "tree");
    }
}
