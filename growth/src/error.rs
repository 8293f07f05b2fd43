//! Domain error kinds returned by the growth engine.

use thiserror::Error;

use crate::core::types::Question;

/// Typed failure of an engine operation.
///
/// Every variant is surfaced to the caller; nothing is retried inside the
/// engine. [`GrowthError::PersistenceUnavailable`] is the only recoverable one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GrowthError {
    /// Tree does not exist, is not current, or belongs to another owner.
    #[error("tree not found")]
    TreeNotFound,

    #[error("question '{0}' was already answered today")]
    AlreadyAnswered(Question),

    #[error("daily questions limit reached")]
    DailyLimitReached,

    #[error("tree is not ready to complete yet (day {day})")]
    TreeNotReady { day: u32 },

    #[error("owner has no current tree")]
    NoCurrentTree,

    #[error("user stats not found")]
    StatsNotFound,

    #[error("invalid question id '{0}'")]
    InvalidQuestion(String),

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(String),
}

impl GrowthError {
    /// Stable machine-readable code used by transports.
    pub fn code(&self) -> &'static str {
        match self {
            GrowthError::TreeNotFound => "TREE_NOT_FOUND",
            GrowthError::AlreadyAnswered(_) => "QUESTION_ALREADY_ANSWERED",
            GrowthError::DailyLimitReached => "DAILY_LIMIT_REACHED",
            GrowthError::TreeNotReady { .. } => "TREE_NOT_READY",
            GrowthError::NoCurrentTree => "NO_CURRENT_TREE",
            GrowthError::StatsNotFound => "STATS_NOT_FOUND",
            GrowthError::InvalidQuestion(_) => "VALIDATION_ERROR",
            GrowthError::PersistenceUnavailable(_) => "PERSISTENCE_UNAVAILABLE",
        }
    }

    /// True if the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GrowthError::PersistenceUnavailable(_))
    }
}

impl From<rusqlite::Error> for GrowthError {
    fn from(err: rusqlite::Error) -> Self {
        GrowthError::PersistenceUnavailable(err.to_string())
    }
}
