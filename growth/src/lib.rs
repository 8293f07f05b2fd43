//! Growth engine for a habit-tracking forest.
//!
//! Each owner grows one tree at a time over a seven-day cycle. Daily yes/no
//! answers to four habit questions move the tree's health, health decides its
//! stage, and on day seven the tree is retired into the forest and a new one
//! is planted. The crate is split the usual way:
//!
//! - **[`core`]**: Pure, deterministic transitions (health, stage, day,
//!   completion, placement, streaks). No I/O; time is passed in.
//! - **[`io`]**: Side-effecting pieces (config file, clock, SQLite gateway).
//!
//! Orchestration modules ([`submit`], [`lifecycle`], [`today`], [`report`])
//! run core logic inside one gateway transaction each and back both the CLI
//! and the HTTP API.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod habit;
pub mod io;
pub mod lifecycle;
pub mod logging;
pub mod report;
pub mod stats;
pub mod submit;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod today;
pub mod tree;
