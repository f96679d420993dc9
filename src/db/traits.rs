// Database trait — backend-agnostic async interface for all DB operations.
//
// Implementor: SqliteDatabase (wraps rusqlite behind a mutex). All methods
// are async so the sync backend and any future native-async backend fit
// behind a single interface.
//
// The trait mirrors the queries.rs function signatures, so the pipeline and
// report code only ever see `Arc<dyn Database>`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::models::{
    NewShareEvent, Period, PlatformRollupRow, PlatformWeightRow, RecalcRun, RunStatus, ShareEvent,
    ViralCoefficient, ViralMetric,
};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Share events ---

    /// Record a new share event and return its id.
    async fn insert_share_event(&self, event: &NewShareEvent) -> Result<i64>;

    /// Fetch events in [since, until), optionally filtered by content and platform.
    async fn get_events(
        &self,
        content_id: Option<&str>,
        platform: Option<&str>,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ShareEvent>>;

    /// Count a content item's events in [since, until).
    async fn count_events(
        &self,
        content_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u32>;

    /// Page distinct content ids with events since the given time (keyset).
    async fn page_content_ids(
        &self,
        since: DateTime<Utc>,
        after: Option<&str>,
        limit: u32,
    ) -> Result<Vec<String>>;

    /// Count distinct content ids with events since the given time.
    async fn count_distinct_content_ids(&self, since: DateTime<Utc>) -> Result<u32>;

    // --- Viral coefficients ---

    /// Save or replace the coefficient row for (content_id, period).
    async fn upsert_coefficient(&self, row: &ViralCoefficient) -> Result<()>;

    /// Load one coefficient row.
    async fn get_coefficient(
        &self,
        content_id: &str,
        period: Period,
    ) -> Result<Option<ViralCoefficient>>;

    /// Top viral content for a period, deterministically ordered.
    async fn top_viral(
        &self,
        period: Period,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ViralCoefficient>>;

    // --- Viral metrics ---

    /// Save or replace the trending metric row for (content_id, period).
    async fn upsert_metric(&self, row: &ViralMetric) -> Result<()>;

    /// Load one metric row.
    async fn get_metric(&self, content_id: &str, period: Period) -> Result<Option<ViralMetric>>;

    /// Metric rows strictly above the admission threshold, with coefficient
    /// and share count. Returns (metric, coefficient, share_count).
    async fn trending(
        &self,
        period: Period,
        min_score: f64,
        limit: u32,
    ) -> Result<Vec<(ViralMetric, f64, u32)>>;

    /// Rows with a measurable growth rate, fastest first.
    async fn growth_leaders(
        &self,
        period: Period,
        limit: u32,
    ) -> Result<Vec<(ViralMetric, f64, u32)>>;

    // --- Platform rollups ---

    /// Per-platform share counts inside a window.
    async fn platform_share_counts(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<(String, u32)>>;

    /// Window activity joined against coefficient rows, grouped by platform.
    async fn platform_coefficient_rollup(
        &self,
        period: Period,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        viral_threshold: f64,
    ) -> Result<Vec<PlatformRollupRow>>;

    // --- Platform weights ---

    /// All configured platform weights, alphabetically.
    async fn get_platform_weights(&self) -> Result<Vec<PlatformWeightRow>>;

    /// Set a platform's weight (upsert).
    async fn set_platform_weight(&self, platform: &str, weight: f64) -> Result<()>;

    /// Remove a platform's configured weight. Returns false if none existed.
    async fn delete_platform_weight(&self, platform: &str) -> Result<bool>;

    // --- Engine settings ---

    /// All engine setting overrides, alphabetically.
    async fn get_settings(&self) -> Result<Vec<(String, String)>>;

    /// Set an engine setting (upsert).
    async fn set_setting(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a setting override. Returns false if none existed.
    async fn delete_setting(&self, key: &str) -> Result<bool>;

    // --- Recalculation runs ---

    /// Start a run if no live run holds the lock. Returns the new run id,
    /// or None when another unfinished run started within the lock timeout.
    async fn try_begin_run(
        &self,
        period: Option<&str>,
        lock_timeout_secs: i64,
    ) -> Result<Option<i64>>;

    /// Update a run's live progress counters.
    async fn update_run_progress(&self, run_id: i64, processed: u32, failed: u32) -> Result<()>;

    /// Mark a run finished with its final status and counters.
    async fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        processed: u32,
        failed: u32,
    ) -> Result<()>;

    /// The most recent run, if any.
    async fn last_run(&self) -> Result<Option<RecalcRun>>;

    // --- Status counters ---

    /// Total share events recorded.
    async fn count_share_events(&self) -> Result<i64>;

    /// Total coefficient rows across all periods.
    async fn count_coefficients(&self) -> Result<i64>;

    /// Total metric rows across all periods.
    async fn count_metrics(&self) -> Result<i64>;

    /// Timestamp of the most recent share event, if any.
    async fn latest_event_at(&self) -> Result<Option<String>>;
}
