// Database schema — table creation and migrations.
//
// Migrations are a version ladder: `schema_version` records each applied
// step, and every step is a closure of SQL that runs at most once. New
// columns are always added through a step so old databases upgrade in place.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create any missing tables and apply pending migrations.
///
/// Idempotent: `wildfire init` and every re-run land on the same schema.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Append-only share event log, written by the sharing subsystem.
        -- The engine only ever reads these.
        CREATE TABLE IF NOT EXISTS share_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content_id TEXT NOT NULL,
            content_type TEXT NOT NULL DEFAULT 'post',
            platform TEXT NOT NULL,
            user_id TEXT,                      -- null for anonymous shares
            click_count INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Computed viral coefficients, one row per (content_id, period).
        -- Recalculation upserts these; latest value wins.
        CREATE TABLE IF NOT EXISTS viral_coefficients (
            content_id TEXT NOT NULL,
            period TEXT NOT NULL,              -- '1day' / '7days' / '30days'
            viral_coefficient REAL NOT NULL,   -- >= 0.0
            share_count INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (content_id, period)
        );

        -- Derived trending metrics, same upsert key as coefficients
        CREATE TABLE IF NOT EXISTS viral_metrics (
            content_id TEXT NOT NULL,
            period TEXT NOT NULL,
            trending_score REAL NOT NULL,      -- 0.0 to 1.0
            growth_rate REAL,                  -- null when no previous-window baseline
            computed_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (content_id, period)
        );

        -- Admin-configured platform amplification weights
        CREATE TABLE IF NOT EXISTS platform_weights (
            platform TEXT PRIMARY KEY,
            weight REAL NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Engine tuning knobs (decay factor, thresholds, page sizes).
        -- Missing or invalid keys fall back to documented defaults.
        CREATE TABLE IF NOT EXISTS engine_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Recalculation runs. An unfinished row doubles as the run lock.
        CREATE TABLE IF NOT EXISTS recalc_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            period TEXT,                       -- null = all periods
            status TEXT NOT NULL DEFAULT 'running',
            items_processed INTEGER NOT NULL DEFAULT 0,
            items_failed INTEGER NOT NULL DEFAULT 0,
            started_at TEXT NOT NULL DEFAULT (datetime('now')),
            finished_at TEXT
        );

        -- Index for per-content window scans during recalculation
        CREATE INDEX IF NOT EXISTS idx_events_content
            ON share_events(content_id, created_at);

        -- Index for window-wide scans (paging content ids, platform rollups)
        CREATE INDEX IF NOT EXISTS idx_events_created
            ON share_events(created_at);

        -- Index for the top-viral ordering within a period
        CREATE INDEX IF NOT EXISTS idx_coefficients_rank
            ON viral_coefficients(period, viral_coefficient);

        -- Index for the trending ordering within a period
        CREATE INDEX IF NOT EXISTS idx_metrics_score
            ON viral_metrics(period, trending_score);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    // Migration v2: add platform_breakdown column to viral_coefficients.
    // Stores the decayed weighted contribution per platform as a JSON
    // object, kept as evidence for rollups and report detail.
    run_migration(conn, 2, |c| {
        c.execute_batch("ALTER TABLE viral_coefficients ADD COLUMN platform_breakdown TEXT;")
    })?;

    // Migration v3: add click_total column to viral_coefficients so the
    // reporting views can show clicks without rescanning events.
    run_migration(conn, 3, |c| {
        c.execute_batch(
            "ALTER TABLE viral_coefficients ADD COLUMN click_total INTEGER NOT NULL DEFAULT 0;",
        )
    })?;

    Ok(())
}

/// Apply one migration step unless `schema_version` says it already ran.
fn run_migration<F>(conn: &Connection, version: i64, migrate: F) -> Result<()>
where
    F: FnOnce(&Connection) -> rusqlite::Result<()>,
{
    let applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM schema_version WHERE version = ?1",
        [version],
        |row| row.get(0),
    )?;
    if applied {
        return Ok(());
    }

    migrate(conn).with_context(|| format!("Migration v{version} failed"))?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Number of user tables — `wildfire init` prints this as its confirmation.
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        // Running create_tables twice should not error
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let count = table_count(&conn).unwrap();
        // schema_version, share_events, viral_coefficients, viral_metrics,
        // platform_weights, engine_settings, recalc_runs = 7 tables
        assert_eq!(count, 7i64);
    }

    #[test]
    fn test_migration_v2_adds_breakdown_column() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        // Verify the platform_breakdown column exists by inserting a row with it
        conn.execute(
            "INSERT INTO viral_coefficients
                (content_id, period, viral_coefficient, share_count, platform_breakdown)
             VALUES ('post:1', '7days', 0.34, 15, '{\"facebook\":30.0}')",
            [],
        )
        .unwrap();

        let result: String = conn
            .query_row(
                "SELECT platform_breakdown FROM viral_coefficients WHERE content_id = 'post:1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, "{\"facebook\":30.0}");
    }

    #[test]
    fn test_migration_v3_adds_click_total_column() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        conn.execute(
            "INSERT INTO viral_coefficients
                (content_id, period, viral_coefficient, share_count, click_total)
             VALUES ('post:2', '1day', 0.1, 3, 20)",
            [],
        )
        .unwrap();

        let result: i64 = conn
            .query_row(
                "SELECT click_total FROM viral_coefficients WHERE content_id = 'post:2'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(result, 20);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        // Run create_tables three times — each migration should only run once
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let versions: Vec<i64> = conn
            .prepare("SELECT version FROM schema_version ORDER BY version")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }
}
