//! Deterministic, pure growth-engine logic.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! trees and habit records and take the current time as an argument, so every
//! transition is reproducible in tests.

pub mod answer;
pub mod completion;
pub mod day;
pub mod growth;
pub mod invariants;
pub mod placement;
pub mod tally;
pub mod types;
