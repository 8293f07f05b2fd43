//! Day arithmetic relative to a tree's planting time.

use chrono::{DateTime, Utc};

use crate::core::types::DAYS_PER_TREE;

/// Raw day number: whole days elapsed since planting, plus one.
///
/// Not clamped at the top; completion decisions use this value. A `now`
/// earlier than `planted_at` counts as day 1.
pub fn day_number(planted_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let elapsed = now.signed_duration_since(planted_at).num_days();
    if elapsed <= 0 {
        return 1;
    }
    u32::try_from(elapsed).unwrap_or(u32::MAX).saturating_add(1)
}

/// Day value as persisted on the tree row, always within `1..=DAYS_PER_TREE`.
pub fn stored_day(day: u32) -> u32 {
    day.clamp(1, DAYS_PER_TREE)
}

pub fn is_ready_to_complete(day: u32) -> bool {
    day >= DAYS_PER_TREE
}
