//! SQLite schema for trees, daily habit records and user stats.

use rusqlite::Connection;
use tracing::info;

use crate::error::GrowthError;

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Create tables on first open; no-op when already at `SCHEMA_VERSION`.
pub fn init_schema(conn: &Connection) -> Result<(), GrowthError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        conn.execute_batch(FOREST_SCHEMA)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(GrowthError::PersistenceUnavailable(format!(
            "database schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        )));
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32, GrowthError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
        [],
    )?;
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);
    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<(), GrowthError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// `ux_trees_current` keeps at most one current tree per owner;
/// `UNIQUE (owner_id, tree_id, date)` keeps one habit record per tree and day.
const FOREST_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trees (
    id           TEXT PRIMARY KEY,
    owner_id     TEXT NOT NULL,
    tree_number  INTEGER NOT NULL,
    stage        TEXT NOT NULL DEFAULT 'seed'
                 CHECK (stage IN ('seed', 'sapling', 'bloom', 'decay')),
    health       INTEGER NOT NULL DEFAULT 50 CHECK (health BETWEEN 0 AND 100),
    day          INTEGER NOT NULL DEFAULT 1 CHECK (day BETWEEN 1 AND 7),
    planted_at   TEXT NOT NULL,
    completed_at TEXT,
    is_current   INTEGER NOT NULL DEFAULT 1,
    position_x   REAL NOT NULL DEFAULT 0,
    position_z   REAL NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    UNIQUE (owner_id, tree_number)
);

CREATE UNIQUE INDEX IF NOT EXISTS ux_trees_current
    ON trees (owner_id) WHERE is_current = 1;

CREATE TABLE IF NOT EXISTS daily_habits (
    id             TEXT PRIMARY KEY,
    owner_id       TEXT NOT NULL,
    tree_id        TEXT NOT NULL REFERENCES trees (id) ON DELETE CASCADE,
    date           TEXT NOT NULL,
    mood           TEXT CHECK (mood IN ('positive', 'negative')),
    food           TEXT CHECK (food IN ('positive', 'negative')),
    hydration      TEXT CHECK (hydration IN ('positive', 'negative')),
    sleep          TEXT CHECK (sleep IN ('positive', 'negative')),
    total_positive INTEGER NOT NULL DEFAULT 0 CHECK (total_positive BETWEEN 0 AND 4),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    UNIQUE (owner_id, tree_id, date)
);

CREATE INDEX IF NOT EXISTS idx_habits_owner_date ON daily_habits (owner_id, date);
CREATE INDEX IF NOT EXISTS idx_habits_tree_date ON daily_habits (tree_id, date);

CREATE TABLE IF NOT EXISTS user_stats (
    owner_id               TEXT PRIMARY KEY,
    total_trees_completed  INTEGER NOT NULL DEFAULT 0,
    total_positive_answers INTEGER NOT NULL DEFAULT 0,
    total_negative_answers INTEGER NOT NULL DEFAULT 0,
    current_streak         INTEGER NOT NULL DEFAULT 0,
    longest_streak         INTEGER NOT NULL DEFAULT 0,
    last_activity_date     TEXT
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("first init");
        init_schema(&conn).expect("second init");
        let version: i32 = conn
            .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
            .expect("version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn newer_schema_is_refused() {
        let conn = Connection::open_in_memory().expect("open");
        init_schema(&conn).expect("init");
        set_schema_version(&conn, SCHEMA_VERSION + 1).expect("bump");
        assert!(init_schema(&conn).is_err());
    }
}
