//! Shared deterministic types for the growth engine.
//!
//! These types define stable contracts between core components, the
//! persistence gateway and the HTTP layer. They should not depend on external
//! state or I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

/// Health every freshly planted tree starts with.
pub const INITIAL_HEALTH: u32 = 50;
/// Upper bound of the health scale (lower bound is 0).
pub const MAX_HEALTH: u32 = 100;
/// Health gained on a positive answer, lost on a negative one.
pub const HEALTH_STEP: i32 = 5;
/// Age (in days) at which a tree is retired into the forest.
pub const DAYS_PER_TREE: u32 = 7;
/// Number of habit questions that can be answered per day.
pub const QUESTIONS_PER_DAY: u32 = 4;
/// Angle between consecutive trees on the forest spiral.
pub const GOLDEN_ANGLE_DEGREES: f64 = 137.5;
/// Default radius of the forest spiral.
pub const DEFAULT_FOREST_RADIUS: f64 = 8.0;

/// Coarse growth phase, derived purely from health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Seed,
    Sapling,
    Bloom,
    Decay,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Seed => "seed",
            Stage::Sapling => "sapling",
            Stage::Bloom => "bloom",
            Stage::Decay => "decay",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seed" => Ok(Stage::Seed),
            "sapling" => Ok(Stage::Sapling),
            "bloom" => Ok(Stage::Bloom),
            "decay" => Ok(Stage::Decay),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// The four daily habit questions. Each maps to a fixed slot of a habit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Question {
    Mood,
    Food,
    Hydration,
    Sleep,
}

impl Question {
    pub const ALL: [Question; 4] = [
        Question::Mood,
        Question::Food,
        Question::Hydration,
        Question::Sleep,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Question::Mood => "mood",
            Question::Food => "food",
            Question::Hydration => "hydration",
            Question::Sleep => "sleep",
        }
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Question {
    type Err = GrowthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Question::ALL
            .into_iter()
            .find(|question| question.as_str() == s)
            .ok_or_else(|| GrowthError::InvalidQuestion(s.to_string()))
    }
}

/// Value stored in a habit slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Positive,
    Negative,
}

impl Answer {
    pub fn from_bool(is_positive: bool) -> Self {
        if is_positive {
            Answer::Positive
        } else {
            Answer::Negative
        }
    }

    pub fn is_positive(self) -> bool {
        self == Answer::Positive
    }

    /// Health delta this answer applies to the current tree.
    pub fn health_delta(self) -> i32 {
        match self {
            Answer::Positive => HEALTH_STEP,
            Answer::Negative => -HEALTH_STEP,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Positive => "positive",
            Answer::Negative => "negative",
        }
    }
}

impl FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Answer::Positive),
            "negative" => Ok(Answer::Negative),
            other => Err(format!("unknown answer '{other}'")),
        }
    }
}

/// Forest coordinate on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub z: f64,
}

impl Position {
    /// Where the current tree grows.
    pub const CENTER: Position = Position { x: 0.0, z: 0.0 };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_parses_known_ids_only() {
        assert_eq!("hydration".parse::<Question>(), Ok(Question::Hydration));
        assert_eq!(
            "water".parse::<Question>(),
            Err(GrowthError::InvalidQuestion("water".to_string()))
        );
        // column names from other tables must not sneak through
        assert!("total_positive".parse::<Question>().is_err());
    }

    #[test]
    fn stage_and_answer_round_trip_their_storage_names() {
        for stage in [Stage::Seed, Stage::Sapling, Stage::Bloom, Stage::Decay] {
            assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
        }
        assert_eq!("negative".parse::<Answer>(), Ok(Answer::Negative));
        assert!("maybe".parse::<Answer>().is_err());
    }

    #[test]
    fn answer_deltas_are_symmetric() {
        assert_eq!(Answer::from_bool(true).health_delta(), 5);
        assert_eq!(Answer::from_bool(false).health_delta(), -5);
    }

    #[test]
    fn question_serializes_lowercase() {
        let json = serde_json::to_string(&Question::Sleep).expect("serialize");
        assert_eq!(json, "\"sleep\"");
    }
}
