//! Stats counters and activity streaks.

use chrono::NaiveDate;

use crate::core::types::Answer;
use crate::stats::UserStats;

/// Event that mutates an owner's aggregate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsEvent {
    Answered { answer: Answer, date: NaiveDate },
    TreeCompleted,
}

pub fn apply_stats_event(stats: &mut UserStats, event: StatsEvent) {
    match event {
        StatsEvent::Answered { answer, date } => {
            if answer.is_positive() {
                stats.total_positive_answers += 1;
            } else {
                stats.total_negative_answers += 1;
            }
            record_activity(stats, date);
        }
        StatsEvent::TreeCompleted => stats.total_trees_completed += 1,
    }
}

fn record_activity(stats: &mut UserStats, date: NaiveDate) {
    match stats.last_activity_date {
        // same day, or a clock that went backwards: counters only
        Some(last) if date <= last => return,
        Some(last) if last.succ_opt() == Some(date) => stats.current_streak += 1,
        _ => stats.current_streak = 1,
    }
    stats.longest_streak = stats.longest_streak.max(stats.current_streak);
    stats.last_activity_date = Some(date);
}
