//! Test-only helpers: fixed clock, in-memory stores and tree fixtures.

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use crate::core::growth::stage_of;
use crate::core::types::Position;
use crate::error::GrowthError;
use crate::habit::HabitRecord;
use crate::io::clock::Clock;
use crate::io::store::{Gateway, SqliteStore, UnitOfWork};
use crate::tree::Tree;

/// Owner id used by fixtures.
pub const OWNER: &str = "owner";

/// Deterministic reference time (mid-morning UTC, so +hours stays on the same date).
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0)
        .single()
        .expect("valid fixture time")
}

/// Current tree #1 of [`OWNER`] planted at [`fixed_time`], stage derived from `health`.
pub fn tree_with_health(health: u32) -> Tree {
    let mut tree = Tree::plant(OWNER, 1, Position::CENTER, fixed_time());
    tree.health = health;
    tree.stage = stage_of(health);
    tree
}

/// Empty habit record for `tree` dated on the tree's planting day.
pub fn empty_record(tree: &Tree) -> HabitRecord {
    HabitRecord::empty(
        &tree.owner_id,
        &tree.id,
        tree.planted_at.date_naive(),
        tree.planted_at,
    )
}

pub fn memory_store() -> SqliteStore {
    SqliteStore::open_in_memory().expect("in-memory store")
}

/// Clock that only moves when told to.
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn at_fixture_time() -> Self {
        Self::new(fixed_time())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Gateway whose storage is always down.
pub struct UnavailableStore;

impl Gateway for UnavailableStore {
    fn transaction<T, F>(&self, _f: F) -> Result<T, GrowthError>
    where
        F: FnOnce(&dyn UnitOfWork) -> Result<T, GrowthError>,
    {
        Err(GrowthError::PersistenceUnavailable(
            "database is locked".to_string(),
        ))
    }
}

/// On-disk database in a temporary directory, removed on drop.
pub struct TempForest {
    _dir: TempDir,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl TempForest {
    pub fn new() -> std::io::Result<Self> {
        let dir = tempfile::tempdir()?;
        let db_path = dir.path().join("bloom_forest.db");
        let config_path = dir.path().join("bloom_forest.toml");
        Ok(Self {
            _dir: dir,
            db_path,
            config_path,
        })
    }

    pub fn open(&self) -> Result<SqliteStore, GrowthError> {
        SqliteStore::open(&self.db_path)
    }
}
