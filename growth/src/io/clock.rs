//! Wall-clock abstraction.
//!
//! Day numbers and habit dates are derived from [`Clock::now`], so tests swap
//! in a fixed clock instead of sleeping for days.

use chrono::{DateTime, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
