//! Database schema migrations for dayplan.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| row.get::<_, i32>(0))
        .unwrap_or_else(|e| {
            if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
                tracing::warn!(error = %e, "failed to read schema_version");
            }
            0
        })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: backlog, calendar, history, and blocks.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS work_items (
            id                TEXT PRIMARY KEY,
            title             TEXT NOT NULL,
            description       TEXT,
            estimated_minutes INTEGER,
            min_block_minutes INTEGER,
            category          TEXT NOT NULL DEFAULT 'business',
            priority          INTEGER NOT NULL DEFAULT 0,
            status            TEXT NOT NULL DEFAULT 'open',
            created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS calendar_events (
            id         TEXT PRIMARY KEY,
            title      TEXT NOT NULL,
            start_time TEXT NOT NULL,
            end_time   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS history (
            date      TEXT PRIMARY KEY,
            workout   TEXT,
            completed INTEGER NOT NULL DEFAULT 0,
            lunch     TEXT,
            dinner    TEXT
        );

        CREATE TABLE IF NOT EXISTS blocks (
            id           TEXT PRIMARY KEY,
            plan_date    TEXT NOT NULL,
            title        TEXT NOT NULL,
            block_type   TEXT NOT NULL,
            start_time   TEXT NOT NULL,
            end_time     TEXT NOT NULL,
            status       TEXT NOT NULL DEFAULT 'planned',
            work_item_id TEXT
        );",
    )?;
    set_schema_version(conn, 1)
}

/// v2: structured block detail and range indexes.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let has_detail: bool = conn
        .prepare("SELECT COUNT(*) FROM pragma_table_info('blocks') WHERE name = 'detail'")?
        .query_row([], |row| row.get::<_, i64>(0))
        .map(|n| n > 0)?;
    if !has_detail {
        conn.execute("ALTER TABLE blocks ADD COLUMN detail TEXT", [])?;
    }
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_blocks_start_time ON blocks(start_time);
         CREATE INDEX IF NOT EXISTS idx_calendar_events_start_time ON calendar_events(start_time);
         CREATE INDEX IF NOT EXISTS idx_work_items_status ON work_items(status);",
    )?;
    set_schema_version(conn, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_VERSION);
        let detail_columns: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM pragma_table_info('blocks') WHERE name = 'detail'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(detail_columns, 1);
    }
}
