// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::warn;

use super::models::{
    parse_timestamp, NewShareEvent, Period, PlatformRollupRow, PlatformWeightRow, RecalcRun,
    RunStatus, ShareEvent, ViralCoefficient, ViralMetric,
};

// --- Share events ---

/// Record a new share event. Returns the new row id.
pub fn insert_share_event(conn: &Connection, event: &NewShareEvent) -> Result<i64> {
    let created_at = event.created_at.unwrap_or_else(Utc::now).to_rfc3339();
    conn.execute(
        "INSERT INTO share_events
            (content_id, content_type, platform, user_id, click_count, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.content_id,
            event.content_type,
            event.platform,
            event.user_id,
            event.click_count,
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch events in [since, until), optionally filtered by content and platform.
///
/// Rows whose created_at cannot be parsed are skipped with a warning —
/// a malformed event must never abort a recalculation.
pub fn get_events(
    conn: &Connection,
    content_id: Option<&str>,
    platform: Option<&str>,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<ShareEvent>> {
    let mut sql = String::from(
        "SELECT id, content_id, content_type, platform, user_id, click_count, created_at
         FROM share_events
         WHERE datetime(created_at) >= datetime(?1) AND datetime(created_at) < datetime(?2)",
    );
    let mut args: Vec<String> = vec![since.to_rfc3339(), until.to_rfc3339()];
    if let Some(cid) = content_id {
        args.push(cid.to_string());
        sql.push_str(&format!(" AND content_id = ?{}", args.len()));
    }
    if let Some(p) = platform {
        args.push(p.to_string());
        sql.push_str(&format!(" AND platform = ?{}", args.len()));
    }
    sql.push_str(" ORDER BY datetime(created_at), id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(&args), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, u32>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut events = Vec::new();
    for row in rows {
        let (id, content_id, content_type, platform, user_id, click_count, raw_created) = row?;
        match parse_timestamp(&raw_created) {
            Some(created_at) => events.push(ShareEvent {
                id,
                content_id,
                content_type,
                platform,
                user_id,
                click_count,
                created_at,
            }),
            None => {
                warn!(
                    event_id = id,
                    created_at = raw_created,
                    "Skipping share event with malformed timestamp"
                );
            }
        }
    }
    Ok(events)
}

/// Count a content item's events in [since, until).
pub fn count_events(
    conn: &Connection,
    content_id: &str,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM share_events
         WHERE content_id = ?1
           AND datetime(created_at) >= datetime(?2)
           AND datetime(created_at) < datetime(?3)",
        params![content_id, since.to_rfc3339(), until.to_rfc3339()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Page distinct content ids with any event since the given time, in
/// ascending order. Keyset pagination: pass the last id of the previous
/// page as `after`. Empty content ids are rejected at ingestion, so the
/// empty-string floor matches every real id.
pub fn page_content_ids(
    conn: &Connection,
    since: DateTime<Utc>,
    after: Option<&str>,
    limit: u32,
) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT content_id FROM share_events
         WHERE datetime(created_at) >= datetime(?1) AND content_id > ?2
         ORDER BY content_id
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(
        params![since.to_rfc3339(), after.unwrap_or(""), limit],
        |row| row.get(0),
    )?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

/// Count distinct content ids with any event since the given time.
pub fn count_distinct_content_ids(conn: &Connection, since: DateTime<Utc>) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(DISTINCT content_id) FROM share_events
         WHERE datetime(created_at) >= datetime(?1)",
        params![since.to_rfc3339()],
        |row| row.get(0),
    )?;
    Ok(count)
}

// --- Viral coefficients ---

/// Save or replace the coefficient row for (content_id, period).
pub fn upsert_coefficient(conn: &Connection, row: &ViralCoefficient) -> Result<()> {
    let breakdown_json = serde_json::to_string(&row.platform_breakdown)?;
    conn.execute(
        "INSERT INTO viral_coefficients
            (content_id, period, viral_coefficient, share_count, click_total,
             platform_breakdown, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, datetime('now'))
         ON CONFLICT(content_id, period) DO UPDATE SET
            viral_coefficient = ?3,
            share_count = ?4,
            click_total = ?5,
            platform_breakdown = ?6,
            updated_at = datetime('now')",
        params![
            row.content_id,
            row.period.as_str(),
            row.viral_coefficient,
            row.share_count,
            row.click_total,
            breakdown_json,
        ],
    )?;
    Ok(())
}

/// Load one coefficient row.
pub fn get_coefficient(
    conn: &Connection,
    content_id: &str,
    period: Period,
) -> Result<Option<ViralCoefficient>> {
    let mut stmt = conn.prepare(
        "SELECT content_id, viral_coefficient, share_count, click_total,
                platform_breakdown, updated_at
         FROM viral_coefficients
         WHERE content_id = ?1 AND period = ?2",
    )?;
    let result = stmt
        .query_row(params![content_id, period.as_str()], |row| {
            map_coefficient_row(row, period)
        })
        .optional()?;
    Ok(result)
}

/// Top viral content for a period: coefficient desc, shares desc, then
/// content_id asc so ties break the same way every time.
pub fn top_viral(
    conn: &Connection,
    period: Period,
    limit: u32,
    offset: u32,
) -> Result<Vec<ViralCoefficient>> {
    let mut stmt = conn.prepare(
        "SELECT content_id, viral_coefficient, share_count, click_total,
                platform_breakdown, updated_at
         FROM viral_coefficients
         WHERE period = ?1
         ORDER BY viral_coefficient DESC, share_count DESC, content_id ASC
         LIMIT ?2 OFFSET ?3",
    )?;
    let rows = stmt.query_map(params![period.as_str(), limit, offset], |row| {
        map_coefficient_row(row, period)
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn map_coefficient_row(
    row: &rusqlite::Row<'_>,
    period: Period,
) -> rusqlite::Result<ViralCoefficient> {
    let breakdown_json: Option<String> = row.get(4)?;
    let platform_breakdown = breakdown_json
        .and_then(|json| serde_json::from_str(&json).ok())
        .unwrap_or_default();
    Ok(ViralCoefficient {
        content_id: row.get(0)?,
        period,
        viral_coefficient: row.get(1)?,
        share_count: row.get(2)?,
        click_total: row.get(3)?,
        platform_breakdown,
        updated_at: row.get(5)?,
    })
}

// --- Viral metrics ---

/// Save or replace the trending metric row for (content_id, period).
pub fn upsert_metric(conn: &Connection, row: &ViralMetric) -> Result<()> {
    conn.execute(
        "INSERT INTO viral_metrics (content_id, period, trending_score, growth_rate, computed_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(content_id, period) DO UPDATE SET
            trending_score = ?3,
            growth_rate = ?4,
            computed_at = datetime('now')",
        params![
            row.content_id,
            row.period.as_str(),
            row.trending_score,
            row.growth_rate,
        ],
    )?;
    Ok(())
}

/// Load one metric row.
pub fn get_metric(
    conn: &Connection,
    content_id: &str,
    period: Period,
) -> Result<Option<ViralMetric>> {
    let mut stmt = conn.prepare(
        "SELECT content_id, trending_score, growth_rate, computed_at
         FROM viral_metrics
         WHERE content_id = ?1 AND period = ?2",
    )?;
    let result = stmt
        .query_row(params![content_id, period.as_str()], |row| {
            map_metric_row(row, period)
        })
        .optional()?;
    Ok(result)
}

/// Trending rows strictly above the admission threshold, joined with their
/// coefficient rows for display. Returns (metric, coefficient, share_count).
pub fn trending(
    conn: &Connection,
    period: Period,
    min_score: f64,
    limit: u32,
) -> Result<Vec<(ViralMetric, f64, u32)>> {
    let mut stmt = conn.prepare(
        "SELECT m.content_id, m.trending_score, m.growth_rate, m.computed_at,
                c.viral_coefficient, c.share_count
         FROM viral_metrics m
         JOIN viral_coefficients c ON c.content_id = m.content_id AND c.period = m.period
         WHERE m.period = ?1 AND m.trending_score > ?2
         ORDER BY m.trending_score DESC, m.content_id ASC
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(params![period.as_str(), min_score, limit], |row| {
        Ok((map_metric_row(row, period)?, row.get(4)?, row.get(5)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Growth leaders: rows with a measurable growth rate, fastest first.
/// Null-growth rows (no previous-window baseline) are excluded — there is
/// nothing meaningful to sort them by.
pub fn growth_leaders(
    conn: &Connection,
    period: Period,
    limit: u32,
) -> Result<Vec<(ViralMetric, f64, u32)>> {
    let mut stmt = conn.prepare(
        "SELECT m.content_id, m.trending_score, m.growth_rate, m.computed_at,
                c.viral_coefficient, c.share_count
         FROM viral_metrics m
         JOIN viral_coefficients c ON c.content_id = m.content_id AND c.period = m.period
         WHERE m.period = ?1 AND m.growth_rate IS NOT NULL
         ORDER BY m.growth_rate DESC, m.content_id ASC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![period.as_str(), limit], |row| {
        Ok((map_metric_row(row, period)?, row.get(4)?, row.get(5)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn map_metric_row(row: &rusqlite::Row<'_>, period: Period) -> rusqlite::Result<ViralMetric> {
    Ok(ViralMetric {
        content_id: row.get(0)?,
        period,
        trending_score: row.get(1)?,
        growth_rate: row.get(2)?,
        computed_at: row.get(3)?,
    })
}

// --- Platform rollups ---

/// Per-platform share counts inside a window.
pub fn platform_share_counts(
    conn: &Connection,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<(String, u32)>> {
    let mut stmt = conn.prepare(
        "SELECT platform, COUNT(*) FROM share_events
         WHERE datetime(created_at) >= datetime(?1) AND datetime(created_at) < datetime(?2)
         GROUP BY platform
         ORDER BY platform",
    )?;
    let rows = stmt.query_map(params![since.to_rfc3339(), until.to_rfc3339()], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Join window activity against coefficient rows, grouped by platform.
pub fn platform_coefficient_rollup(
    conn: &Connection,
    period: Period,
    since: DateTime<Utc>,
    until: DateTime<Utc>,
    viral_threshold: f64,
) -> Result<Vec<PlatformRollupRow>> {
    let mut stmt = conn.prepare(
        "SELECT a.platform,
                AVG(c.viral_coefficient),
                COUNT(DISTINCT CASE WHEN c.viral_coefficient >= ?4 THEN c.content_id END),
                COALESCE(SUM(CASE WHEN c.viral_coefficient >= ?4 THEN a.shares ELSE 0 END), 0)
         FROM (SELECT platform, content_id, COUNT(*) AS shares
                 FROM share_events
                WHERE datetime(created_at) >= datetime(?1)
                  AND datetime(created_at) < datetime(?2)
                GROUP BY platform, content_id) a
         JOIN viral_coefficients c ON c.content_id = a.content_id AND c.period = ?3
         GROUP BY a.platform
         ORDER BY a.platform",
    )?;
    let rows = stmt.query_map(
        params![
            since.to_rfc3339(),
            until.to_rfc3339(),
            period.as_str(),
            viral_threshold,
        ],
        |row| {
            Ok(PlatformRollupRow {
                platform: row.get(0)?,
                avg_coefficient: row.get(1)?,
                viral_content_count: row.get(2)?,
                viral_share_count: row.get(3)?,
            })
        },
    )?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

// --- Platform weights ---

/// All configured platform weights, alphabetically.
pub fn get_platform_weights(conn: &Connection) -> Result<Vec<PlatformWeightRow>> {
    let mut stmt = conn.prepare(
        "SELECT platform, weight, updated_at FROM platform_weights ORDER BY platform",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(PlatformWeightRow {
            platform: row.get(0)?,
            weight: row.get(1)?,
            updated_at: row.get(2)?,
        })
    })?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Set a platform's weight (upsert).
pub fn set_platform_weight(conn: &Connection, platform: &str, weight: f64) -> Result<()> {
    conn.execute(
        "INSERT INTO platform_weights (platform, weight, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(platform) DO UPDATE SET weight = ?2, updated_at = datetime('now')",
        params![platform, weight],
    )?;
    Ok(())
}

/// Remove a platform's configured weight. Returns false if none existed.
pub fn delete_platform_weight(conn: &Connection, platform: &str) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM platform_weights WHERE platform = ?1",
        params![platform],
    )?;
    Ok(changed > 0)
}

// --- Engine settings ---

/// All engine settings overrides, alphabetically.
pub fn get_settings(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM engine_settings ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Set an engine setting (upsert).
pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO engine_settings (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

/// Remove a setting override. Returns false if none existed.
pub fn delete_setting(conn: &Connection, key: &str) -> Result<bool> {
    let changed = conn.execute("DELETE FROM engine_settings WHERE key = ?1", params![key])?;
    Ok(changed > 0)
}

// --- Recalculation runs ---

/// Start a run if no other live run holds the lock. Returns the new run id,
/// or None when an unfinished run started within the lock timeout.
///
/// The existence check and the insert are a single statement, so two
/// concurrent triggers cannot both win. A run older than the timeout is
/// treated as abandoned and no longer blocks.
pub fn try_begin_run(
    conn: &Connection,
    period: Option<&str>,
    lock_timeout_secs: i64,
) -> Result<Option<i64>> {
    let changed = conn.execute(
        "INSERT INTO recalc_runs (period, status)
         SELECT ?1, 'running'
         WHERE NOT EXISTS (
             SELECT 1 FROM recalc_runs
             WHERE finished_at IS NULL
               AND datetime(started_at) > datetime('now', ?2)
         )",
        params![period, format!("-{lock_timeout_secs} seconds")],
    )?;
    if changed == 1 {
        Ok(Some(conn.last_insert_rowid()))
    } else {
        Ok(None)
    }
}

/// Update a run's live progress counters (called at page boundaries).
pub fn update_run_progress(conn: &Connection, run_id: i64, processed: u32, failed: u32) -> Result<()> {
    conn.execute(
        "UPDATE recalc_runs SET items_processed = ?2, items_failed = ?3 WHERE id = ?1",
        params![run_id, processed, failed],
    )?;
    Ok(())
}

/// Mark a run finished with its final status and counters.
pub fn finish_run(
    conn: &Connection,
    run_id: i64,
    status: RunStatus,
    processed: u32,
    failed: u32,
) -> Result<()> {
    conn.execute(
        "UPDATE recalc_runs
         SET status = ?2, items_processed = ?3, items_failed = ?4,
             finished_at = datetime('now')
         WHERE id = ?1",
        params![run_id, status.as_str(), processed, failed],
    )?;
    Ok(())
}

/// The most recent run, if any.
pub fn last_run(conn: &Connection) -> Result<Option<RecalcRun>> {
    let mut stmt = conn.prepare(
        "SELECT id, period, status, items_processed, items_failed, started_at, finished_at
         FROM recalc_runs
         ORDER BY id DESC
         LIMIT 1",
    )?;
    let result = stmt
        .query_row([], |row| {
            Ok(RecalcRun {
                id: row.get(0)?,
                period: row.get(1)?,
                status: row.get(2)?,
                items_processed: row.get(3)?,
                items_failed: row.get(4)?,
                started_at: row.get(5)?,
                finished_at: row.get(6)?,
            })
        })
        .optional()?;
    Ok(result)
}

// --- Status counters ---

pub fn count_share_events(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM share_events", [], |row| row.get(0))?)
}

pub fn count_coefficients(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM viral_coefficients", [], |row| row.get(0))?)
}

pub fn count_metrics(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM viral_metrics", [], |row| row.get(0))?)
}

/// Timestamp of the most recent share event, if any.
pub fn latest_event_at(conn: &Connection) -> Result<Option<String>> {
    let result: Option<String> = conn.query_row(
        "SELECT MAX(datetime(created_at)) FROM share_events",
        [],
        |row| row.get(0),
    )?;
    Ok(result)
}

// rusqlite's optional() helper — converts "no rows" into None
use rusqlite::OptionalExtension;
