//! Stable exit codes for `growth` CLI commands.

use crate::error::GrowthError;

/// Command succeeded.
pub const OK: i32 = 0;
/// Bad arguments, config, or a failed `check`.
pub const INVALID: i32 = 1;
/// The engine refused the request (already answered, limit reached, not ready).
pub const REJECTED: i32 = 2;
/// Tree, current tree, or stats row not found.
pub const NOT_FOUND: i32 = 3;
/// Storage unavailable; the same command may succeed if retried.
pub const UNAVAILABLE: i32 = 4;

/// Exit code for a failed engine operation.
pub fn for_error(err: &GrowthError) -> i32 {
    match err {
        GrowthError::TreeNotFound | GrowthError::NoCurrentTree | GrowthError::StatsNotFound => {
            NOT_FOUND
        }
        GrowthError::AlreadyAnswered(_)
        | GrowthError::DailyLimitReached
        | GrowthError::TreeNotReady { .. } => REJECTED,
        GrowthError::InvalidQuestion(_) => INVALID,
        GrowthError::PersistenceUnavailable(_) => UNAVAILABLE,
    }
}
