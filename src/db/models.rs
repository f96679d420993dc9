// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The aggregation window a coefficient or metric row is computed over.
///
/// Stored as text in the DB ("1day" / "7days" / "30days") and used as half
/// of the upsert key on both `viral_coefficients` and `viral_metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1day")]
    OneDay,
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "30days")]
    ThirtyDays,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::OneDay, Period::SevenDays, Period::ThirtyDays];

    /// Window length in whole days.
    pub fn days(&self) -> i64 {
        match self {
            Period::OneDay => 1,
            Period::SevenDays => 7,
            Period::ThirtyDays => 30,
        }
    }

    /// Window length as a chrono duration.
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(self.days())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1day",
            Period::SevenDays => "7days",
            Period::ThirtyDays => "30days",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1day" => Ok(Period::OneDay),
            "7days" => Ok(Period::SevenDays),
            "30days" => Ok(Period::ThirtyDays),
            _ => anyhow::bail!("Unknown period '{s}'. Valid periods: 1day, 7days, 30days"),
        }
    }
}

/// A recorded share event. Immutable once recorded — the engine only reads
/// these; recalculation never mutates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareEvent {
    pub id: i64,
    pub content_id: String,
    pub content_type: String,
    pub platform: String,
    pub user_id: Option<String>,
    pub click_count: u32,
    pub created_at: DateTime<Utc>,
}

/// A share event as supplied by the sharing subsystem, before it has an id.
///
/// Doubles as the JSONL import line format: only `content_id` and
/// `platform` are required, everything else has a sensible default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShareEvent {
    pub content_id: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    pub platform: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub click_count: u32,
    /// Defaults to "now" at insert time when omitted.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_content_type() -> String {
    "post".to_string()
}

/// One computed coefficient row per (content_id, period).
///
/// Recalculation overwrites these (upsert on the composite key) — latest
/// value wins, no history is kept beyond what the periods provide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViralCoefficient {
    pub content_id: String,
    pub period: Period,
    pub viral_coefficient: f64,
    pub share_count: u32,
    pub click_total: u32,
    /// Decayed weighted contribution per platform (JSON-encoded in the DB)
    pub platform_breakdown: BTreeMap<String, f64>,
    pub updated_at: String,
}

/// Derived trending metrics for one (content_id, period), recomputed each
/// cycle from the coefficient and the adjacent-window share counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViralMetric {
    pub content_id: String,
    pub period: Period,
    pub trending_score: f64,
    /// Percent change vs the previous window. None when the previous window
    /// had no shares — "no baseline" is not the same as "no growth".
    pub growth_rate: Option<f64>,
    pub computed_at: String,
}

/// An admin-configured platform amplification weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformWeightRow {
    pub platform: String,
    pub weight: f64,
    pub updated_at: String,
}

/// A per-platform coefficient rollup row for one period window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformRollupRow {
    pub platform: String,
    /// Mean coefficient across content active on this platform in the window
    pub avg_coefficient: f64,
    /// Distinct content at or above the viral threshold
    pub viral_content_count: u32,
    /// This platform's share count on that viral content
    pub viral_share_count: u32,
}

/// Lifecycle states of a recalculation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recalculation run row — one per accepted `trigger_recalculation`.
///
/// An unfinished row (finished_at NULL) inside the lock timeout is the
/// single-flight guard: a second trigger sees it and refuses to start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalcRun {
    pub id: i64,
    /// The requested period scope; None means all periods.
    pub period: Option<String>,
    pub status: String,
    pub items_processed: u32,
    pub items_failed: u32,
    pub started_at: String,
    pub finished_at: Option<String>,
}

/// Parse a stored timestamp tolerantly.
///
/// Events written by this crate use RFC 3339. Rows created by SQLite
/// column defaults (and some importers) use "YYYY-MM-DD HH:MM:SS", which
/// is read as UTC. Anything else is a data error — callers skip the row.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
