//! Persistence gateway for trees, habit records and user stats.
//!
//! The [`Gateway`] trait hands out a [`UnitOfWork`] inside one transaction:
//! everything an engine operation reads and writes commits together or not at
//! all. [`SqliteStore`] is the production implementation; tests use an
//! in-memory database or a gateway that always fails.

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use tracing::{debug, info, instrument, warn};

use crate::core::types::{Answer, Position};
use crate::error::GrowthError;
use crate::habit::{HabitRecord, HabitSlots};
use crate::io::schema::init_schema;
use crate::stats::{HabitAggregates, TreeAggregates, UserStats};
use crate::tree::Tree;

/// Source of transactional units of work.
pub trait Gateway {
    /// Run `f` in one transaction. Commits if `f` returns `Ok`, rolls back otherwise.
    fn transaction<T, F>(&self, f: F) -> Result<T, GrowthError>
    where
        F: FnOnce(&dyn UnitOfWork) -> Result<T, GrowthError>;
}

/// Reads and writes available inside a transaction.
pub trait UnitOfWork {
    fn find_current_tree(&self, owner_id: &str) -> Result<Option<Tree>, GrowthError>;
    /// Tree by id, only if it belongs to `owner_id` (current or retired).
    fn find_tree(&self, owner_id: &str, tree_id: &str) -> Result<Option<Tree>, GrowthError>;
    fn list_trees(&self, owner_id: &str) -> Result<Vec<Tree>, GrowthError>;
    fn count_trees(&self, owner_id: &str) -> Result<u32, GrowthError>;
    fn insert_tree(&self, tree: &Tree) -> Result<(), GrowthError>;
    fn update_tree(&self, tree: &Tree) -> Result<(), GrowthError>;

    fn find_habit_record(
        &self,
        owner_id: &str,
        tree_id: &str,
        date: NaiveDate,
    ) -> Result<Option<HabitRecord>, GrowthError>;
    /// Insert `record` unless a record for its (owner, tree, date) exists;
    /// either way return the stored record.
    fn insert_or_fetch_habit_record(&self, record: &HabitRecord)
    -> Result<HabitRecord, GrowthError>;
    fn update_habit_record(&self, record: &HabitRecord) -> Result<(), GrowthError>;
    /// Records of one tree, newest date first.
    fn habit_history(
        &self,
        owner_id: &str,
        tree_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<HabitRecord>, GrowthError>;
    /// All records of an owner, oldest date first.
    fn habit_records(&self, owner_id: &str) -> Result<Vec<HabitRecord>, GrowthError>;

    /// Load the owner's stats row, creating a zeroed one if missing.
    fn ensure_user_stats(&self, owner_id: &str) -> Result<UserStats, GrowthError>;
    fn load_user_stats(&self, owner_id: &str) -> Result<Option<UserStats>, GrowthError>;
    fn save_user_stats(&self, stats: &UserStats) -> Result<(), GrowthError>;

    fn tree_aggregates(&self, owner_id: &str) -> Result<TreeAggregates, GrowthError>;
    fn habit_aggregates(&self, owner_id: &str) -> Result<HabitAggregates, GrowthError>;
}

/// SQLite-backed gateway. One connection, serialized behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, GrowthError> {
        info!(path = %path.display(), "opening forest database");
        let conn = Connection::open(path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_in_memory() -> Result<Self, GrowthError> {
        debug!("opening in-memory forest database");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, GrowthError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl Gateway for SqliteStore {
    #[instrument(skip_all)]
    fn transaction<T, F>(&self, f: F) -> Result<T, GrowthError>
    where
        F: FnOnce(&dyn UnitOfWork) -> Result<T, GrowthError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| GrowthError::PersistenceUnavailable(format!("Lock poisoned: {}", e)))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        match f(&*tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                debug!(error = %err, "rolling back transaction");
                Err(keep_cause(err, tx.rollback()))
            }
        }
    }
}

/// The error that aborted a transaction wins over a failed rollback.
fn keep_cause(err: GrowthError, rollback: rusqlite::Result<()>) -> GrowthError {
    if let Err(rollback_err) = rollback {
        warn!(error = %rollback_err, cause = %err, "rollback failed");
    }
    err
}

macro_rules! select_trees {
    ($tail:literal) => {
        concat!(
            "SELECT id, owner_id, tree_number, stage, health, day, planted_at, completed_at, \
             is_current, position_x, position_z, created_at, updated_at FROM trees ",
            $tail
        )
    };
}

macro_rules! select_habits {
    ($tail:literal) => {
        concat!(
            "SELECT id, owner_id, tree_id, date, mood, food, hydration, sleep, total_positive, \
             created_at, updated_at FROM daily_habits ",
            $tail
        )
    };
}

impl UnitOfWork for Connection {
    fn find_current_tree(&self, owner_id: &str) -> Result<Option<Tree>, GrowthError> {
        let tree = self
            .query_row(
                select_trees!("WHERE owner_id = ?1 AND is_current = 1"),
                params![owner_id],
                tree_from_row,
            )
            .optional()?;
        Ok(tree)
    }

    fn find_tree(&self, owner_id: &str, tree_id: &str) -> Result<Option<Tree>, GrowthError> {
        let tree = self
            .query_row(
                select_trees!("WHERE id = ?1 AND owner_id = ?2"),
                params![tree_id, owner_id],
                tree_from_row,
            )
            .optional()?;
        Ok(tree)
    }

    fn list_trees(&self, owner_id: &str) -> Result<Vec<Tree>, GrowthError> {
        let mut stmt = self.prepare(select_trees!("WHERE owner_id = ?1 ORDER BY tree_number ASC"))?;
        let trees = stmt
            .query_map(params![owner_id], tree_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trees)
    }

    fn count_trees(&self, owner_id: &str) -> Result<u32, GrowthError> {
        let count = self.query_row(
            "SELECT COUNT(*) FROM trees WHERE owner_id = ?1",
            params![owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn insert_tree(&self, tree: &Tree) -> Result<(), GrowthError> {
        debug!(tree_id = %tree.id, tree_number = tree.tree_number, "inserting tree");
        self.execute(
            "INSERT INTO trees (id, owner_id, tree_number, stage, health, day, planted_at, \
             completed_at, is_current, position_x, position_z, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                tree.id,
                tree.owner_id,
                tree.tree_number,
                tree.stage.as_str(),
                tree.health,
                tree.day,
                tree.planted_at,
                tree.completed_at,
                tree.is_current,
                tree.position.x,
                tree.position.z,
                tree.created_at,
                tree.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_tree(&self, tree: &Tree) -> Result<(), GrowthError> {
        debug!(tree_id = %tree.id, health = tree.health, stage = %tree.stage, day = tree.day, "updating tree");
        let changed = self.execute(
            "UPDATE trees SET stage = ?1, health = ?2, day = ?3, completed_at = ?4, \
             is_current = ?5, position_x = ?6, position_z = ?7, updated_at = ?8 \
             WHERE id = ?9 AND owner_id = ?10",
            params![
                tree.stage.as_str(),
                tree.health,
                tree.day,
                tree.completed_at,
                tree.is_current,
                tree.position.x,
                tree.position.z,
                tree.updated_at,
                tree.id,
                tree.owner_id,
            ],
        )?;
        if changed == 0 {
            return Err(GrowthError::TreeNotFound);
        }
        Ok(())
    }

    fn find_habit_record(
        &self,
        owner_id: &str,
        tree_id: &str,
        date: NaiveDate,
    ) -> Result<Option<HabitRecord>, GrowthError> {
        let record = self
            .query_row(
                select_habits!("WHERE owner_id = ?1 AND tree_id = ?2 AND date = ?3"),
                params![owner_id, tree_id, date],
                habit_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn insert_or_fetch_habit_record(
        &self,
        record: &HabitRecord,
    ) -> Result<HabitRecord, GrowthError> {
        let inserted = self.execute(
            "INSERT INTO daily_habits (id, owner_id, tree_id, date, mood, food, hydration, \
             sleep, total_positive, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
             ON CONFLICT (owner_id, tree_id, date) DO NOTHING",
            params![
                record.id,
                record.owner_id,
                record.tree_id,
                record.date,
                slot_text(record.slots.mood),
                slot_text(record.slots.food),
                slot_text(record.slots.hydration),
                slot_text(record.slots.sleep),
                record.total_positive,
                record.created_at,
                record.updated_at,
            ],
        )?;
        debug!(tree_id = %record.tree_id, date = %record.date, inserted = inserted == 1, "habit record insert-or-fetch");
        self.find_habit_record(&record.owner_id, &record.tree_id, record.date)?
            .ok_or_else(|| {
                GrowthError::PersistenceUnavailable(format!(
                    "habit record for tree {} on {} missing after insert",
                    record.tree_id, record.date
                ))
            })
    }

    fn update_habit_record(&self, record: &HabitRecord) -> Result<(), GrowthError> {
        self.execute(
            "UPDATE daily_habits SET mood = ?1, food = ?2, hydration = ?3, sleep = ?4, \
             total_positive = ?5, updated_at = ?6 WHERE id = ?7",
            params![
                slot_text(record.slots.mood),
                slot_text(record.slots.food),
                slot_text(record.slots.hydration),
                slot_text(record.slots.sleep),
                record.total_positive,
                record.updated_at,
                record.id,
            ],
        )?;
        Ok(())
    }

    fn habit_history(
        &self,
        owner_id: &str,
        tree_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<HabitRecord>, GrowthError> {
        let mut stmt = self.prepare(select_habits!(
            "WHERE owner_id = ?1 AND tree_id = ?2 ORDER BY date DESC LIMIT ?3 OFFSET ?4"
        ))?;
        let records = stmt
            .query_map(params![owner_id, tree_id, limit, offset], habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn habit_records(&self, owner_id: &str) -> Result<Vec<HabitRecord>, GrowthError> {
        let mut stmt = self.prepare(select_habits!("WHERE owner_id = ?1 ORDER BY date ASC"))?;
        let records = stmt
            .query_map(params![owner_id], habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn ensure_user_stats(&self, owner_id: &str) -> Result<UserStats, GrowthError> {
        self.execute(
            "INSERT OR IGNORE INTO user_stats (owner_id) VALUES (?1)",
            params![owner_id],
        )?;
        self.load_user_stats(owner_id)?
            .ok_or(GrowthError::StatsNotFound)
    }

    fn load_user_stats(&self, owner_id: &str) -> Result<Option<UserStats>, GrowthError> {
        let stats = self
            .query_row(
                "SELECT owner_id, total_trees_completed, total_positive_answers, \
                 total_negative_answers, current_streak, longest_streak, last_activity_date \
                 FROM user_stats WHERE owner_id = ?1",
                params![owner_id],
                |row| {
                    Ok(UserStats {
                        owner_id: row.get(0)?,
                        total_trees_completed: row.get(1)?,
                        total_positive_answers: row.get(2)?,
                        total_negative_answers: row.get(3)?,
                        current_streak: row.get(4)?,
                        longest_streak: row.get(5)?,
                        last_activity_date: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(stats)
    }

    fn save_user_stats(&self, stats: &UserStats) -> Result<(), GrowthError> {
        let changed = self.execute(
            "UPDATE user_stats SET total_trees_completed = ?1, total_positive_answers = ?2, \
             total_negative_answers = ?3, current_streak = ?4, longest_streak = ?5, \
             last_activity_date = ?6 WHERE owner_id = ?7",
            params![
                stats.total_trees_completed,
                stats.total_positive_answers,
                stats.total_negative_answers,
                stats.current_streak,
                stats.longest_streak,
                stats.last_activity_date,
                stats.owner_id,
            ],
        )?;
        if changed == 0 {
            return Err(GrowthError::StatsNotFound);
        }
        Ok(())
    }

    fn tree_aggregates(&self, owner_id: &str) -> Result<TreeAggregates, GrowthError> {
        let aggregates = self.query_row(
            "SELECT COUNT(*), AVG(health), MAX(health), MIN(health) FROM trees WHERE owner_id = ?1",
            params![owner_id],
            |row| {
                Ok(TreeAggregates {
                    total_trees: row.get(0)?,
                    average_health: row.get(1)?,
                    best_health: row.get(2)?,
                    worst_health: row.get(3)?,
                })
            },
        )?;
        Ok(aggregates)
    }

    fn habit_aggregates(&self, owner_id: &str) -> Result<HabitAggregates, GrowthError> {
        let aggregates = self.query_row(
            "SELECT COUNT(*), COALESCE(SUM(total_positive), 0), AVG(total_positive) \
             FROM daily_habits WHERE owner_id = ?1",
            params![owner_id],
            |row| {
                Ok(HabitAggregates {
                    days_recorded: row.get(0)?,
                    total_positive: row.get(1)?,
                    average_daily_positive: row.get(2)?,
                })
            },
        )?;
        Ok(aggregates)
    }
}

fn slot_text(answer: Option<Answer>) -> Option<&'static str> {
    answer.map(Answer::as_str)
}

fn tree_from_row(row: &Row<'_>) -> rusqlite::Result<Tree> {
    Ok(Tree {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        tree_number: row.get(2)?,
        stage: parse_text(row, 3)?,
        health: row.get(4)?,
        day: row.get(5)?,
        planted_at: row.get(6)?,
        completed_at: row.get(7)?,
        is_current: row.get(8)?,
        position: Position {
            x: row.get(9)?,
            z: row.get(10)?,
        },
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<HabitRecord> {
    Ok(HabitRecord {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        tree_id: row.get(2)?,
        date: row.get(3)?,
        slots: HabitSlots {
            mood: parse_optional_text(row, 4)?,
            food: parse_optional_text(row, 5)?,
            hydration: parse_optional_text(row, 6)?,
            sleep: parse_optional_text(row, 7)?,
        },
        total_positive: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|err: T::Err| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.to_string().into())
    })
}

fn parse_optional_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = row.get(idx)?;
    raw.map(|value| {
        value.parse().map_err(|err: T::Err| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.to_string().into())
        })
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Question, Stage};
    use crate::test_support::{empty_record, fixed_time, memory_store, tree_with_health};

    #[test]
    fn tree_round_trips_through_sqlite() {
        let store = memory_store();
        let mut tree = tree_with_health(80);
        tree.position = Position { x: 1.5, z: -2.25 };

        let loaded = store
            .transaction(|uow| {
                uow.insert_tree(&tree)?;
                uow.find_tree(&tree.owner_id, &tree.id)
            })
            .expect("transaction")
            .expect("tree exists");

        assert_eq!(loaded, tree);
        assert_eq!(loaded.stage, Stage::Bloom);
    }

    #[test]
    fn find_tree_hides_other_owners_trees() {
        let store = memory_store();
        let tree = tree_with_health(50);
        let found = store
            .transaction(|uow| {
                uow.insert_tree(&tree)?;
                uow.find_tree("intruder", &tree.id)
            })
            .expect("transaction");
        assert!(found.is_none());
    }

    #[test]
    fn second_current_tree_violates_unique_index() {
        let store = memory_store();
        let first = tree_with_health(50);
        let mut second = tree_with_health(50);
        second.tree_number = 2;

        let err = store
            .transaction(|uow| {
                uow.insert_tree(&first)?;
                uow.insert_tree(&second)
            })
            .expect_err("two current trees");
        assert!(err.is_retryable());

        // the failed transaction rolled back the first insert too
        let count = store
            .transaction(|uow| uow.count_trees(&first.owner_id))
            .expect("count");
        assert_eq!(count, 0);
    }

    #[test]
    fn failed_transaction_returns_its_own_error() {
        let store = memory_store();
        let tree = tree_with_health(50);
        let err = store
            .transaction(|uow| {
                uow.insert_tree(&tree)?;
                Err::<(), _>(GrowthError::AlreadyAnswered(Question::Sleep))
            })
            .expect_err("aborted");
        assert_eq!(err, GrowthError::AlreadyAnswered(Question::Sleep));

        let trees = store
            .transaction(|uow| uow.list_trees(&tree.owner_id))
            .expect("list");
        assert!(trees.is_empty());
    }

    #[test]
    fn failed_rollback_keeps_the_original_error() {
        let err = keep_cause(
            GrowthError::AlreadyAnswered(Question::Mood),
            Err(rusqlite::Error::InvalidQuery),
        );
        assert_eq!(err, GrowthError::AlreadyAnswered(Question::Mood));
        assert_eq!(
            keep_cause(GrowthError::NoCurrentTree, Ok(())),
            GrowthError::NoCurrentTree
        );
    }

    #[test]
    fn insert_or_fetch_returns_existing_record() {
        let store = memory_store();
        let tree = tree_with_health(50);
        let mut first = empty_record(&tree);
        first.slots.fill(Question::Food, Answer::Negative);
        let competing = empty_record(&tree);

        let (stored, fetched) = store
            .transaction(|uow| {
                uow.insert_tree(&tree)?;
                let stored = uow.insert_or_fetch_habit_record(&first)?;
                let fetched = uow.insert_or_fetch_habit_record(&competing)?;
                Ok((stored, fetched))
            })
            .expect("transaction");

        assert_eq!(stored, first);
        assert_eq!(fetched.id, first.id);
        assert_eq!(fetched.slots.food, Some(Answer::Negative));
    }

    #[test]
    fn habit_history_is_newest_first_and_paged() {
        let store = memory_store();
        let tree = tree_with_health(50);
        let history = store
            .transaction(|uow| {
                uow.insert_tree(&tree)?;
                for offset in 0..5 {
                    let mut record = empty_record(&tree);
                    record.date = fixed_time().date_naive() + chrono::Duration::days(offset);
                    uow.insert_or_fetch_habit_record(&record)?;
                }
                uow.habit_history(&tree.owner_id, &tree.id, 2, 1)
            })
            .expect("transaction");

        let dates: Vec<NaiveDate> = history.iter().map(|record| record.date).collect();
        let start = fixed_time().date_naive();
        assert_eq!(
            dates,
            vec![start + chrono::Duration::days(3), start + chrono::Duration::days(2)]
        );
    }

    #[test]
    fn stats_row_is_created_once() {
        let store = memory_store();
        let stats = store
            .transaction(|uow| {
                let mut stats = uow.ensure_user_stats("owner")?;
                stats.total_positive_answers = 3;
                uow.save_user_stats(&stats)?;
                uow.ensure_user_stats("owner")
            })
            .expect("transaction");
        assert_eq!(stats.total_positive_answers, 3);
    }

    #[test]
    fn aggregates_on_empty_forest() {
        let store = memory_store();
        let (trees, habits) = store
            .transaction(|uow| Ok((uow.tree_aggregates("nobody")?, uow.habit_aggregates("nobody")?)))
            .expect("transaction");
        assert_eq!(trees, TreeAggregates::default());
        assert_eq!(habits, HabitAggregates::default());
    }

    #[test]
    fn file_database_persists_across_opens() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("forest.db");
        let tree = tree_with_health(65);
        {
            let store = SqliteStore::open(&path).expect("open");
            store
                .transaction(|uow| uow.insert_tree(&tree))
                .expect("insert");
        }
        let store = SqliteStore::open(&path).expect("reopen");
        let loaded = store
            .transaction(|uow| uow.find_current_tree(&tree.owner_id))
            .expect("find");
        assert_eq!(loaded, Some(tree));
    }
}
