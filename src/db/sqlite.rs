// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// Connection is !Sync, so the shared handle sits behind a tokio Mutex.
// Each trait method locks, runs its synchronous rusqlite work, and releases
// before returning — no guard is ever held across an .await, so a slow
// query serializes writers without wedging the runtime.
//
// The SQL itself lives in queries.rs as free functions over &Connection,
// which keeps it testable without the async wrapper.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{
    NewShareEvent, Period, PlatformRollupRow, PlatformWeightRow, RecalcRun, RunStatus, ShareEvent,
    ViralCoefficient, ViralMetric,
};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn insert_share_event(&self, event: &NewShareEvent) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::insert_share_event(&conn, event)
    }

    async fn get_events(
        &self,
        content_id: Option<&str>,
        platform: Option<&str>,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<ShareEvent>> {
        let conn = self.conn.lock().await;
        super::queries::get_events(&conn, content_id, platform, since, until)
    }

    async fn count_events(
        &self,
        content_id: &str,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u32> {
        let conn = self.conn.lock().await;
        super::queries::count_events(&conn, content_id, since, until)
    }

    async fn page_content_ids(
        &self,
        since: DateTime<Utc>,
        after: Option<&str>,
        limit: u32,
    ) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        super::queries::page_content_ids(&conn, since, after, limit)
    }

    async fn count_distinct_content_ids(&self, since: DateTime<Utc>) -> Result<u32> {
        let conn = self.conn.lock().await;
        super::queries::count_distinct_content_ids(&conn, since)
    }

    async fn upsert_coefficient(&self, row: &ViralCoefficient) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_coefficient(&conn, row)
    }

    async fn get_coefficient(
        &self,
        content_id: &str,
        period: Period,
    ) -> Result<Option<ViralCoefficient>> {
        let conn = self.conn.lock().await;
        super::queries::get_coefficient(&conn, content_id, period)
    }

    async fn top_viral(
        &self,
        period: Period,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ViralCoefficient>> {
        let conn = self.conn.lock().await;
        super::queries::top_viral(&conn, period, limit, offset)
    }

    async fn upsert_metric(&self, row: &ViralMetric) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::upsert_metric(&conn, row)
    }

    async fn get_metric(&self, content_id: &str, period: Period) -> Result<Option<ViralMetric>> {
        let conn = self.conn.lock().await;
        super::queries::get_metric(&conn, content_id, period)
    }

    async fn trending(
        &self,
        period: Period,
        min_score: f64,
        limit: u32,
    ) -> Result<Vec<(ViralMetric, f64, u32)>> {
        let conn = self.conn.lock().await;
        super::queries::trending(&conn, period, min_score, limit)
    }

    async fn growth_leaders(
        &self,
        period: Period,
        limit: u32,
    ) -> Result<Vec<(ViralMetric, f64, u32)>> {
        let conn = self.conn.lock().await;
        super::queries::growth_leaders(&conn, period, limit)
    }

    async fn platform_share_counts(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<(String, u32)>> {
        let conn = self.conn.lock().await;
        super::queries::platform_share_counts(&conn, since, until)
    }

    async fn platform_coefficient_rollup(
        &self,
        period: Period,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        viral_threshold: f64,
    ) -> Result<Vec<PlatformRollupRow>> {
        let conn = self.conn.lock().await;
        super::queries::platform_coefficient_rollup(&conn, period, since, until, viral_threshold)
    }

    async fn get_platform_weights(&self) -> Result<Vec<PlatformWeightRow>> {
        let conn = self.conn.lock().await;
        super::queries::get_platform_weights(&conn)
    }

    async fn set_platform_weight(&self, platform: &str, weight: f64) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_platform_weight(&conn, platform, weight)
    }

    async fn delete_platform_weight(&self, platform: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::delete_platform_weight(&conn, platform)
    }

    async fn get_settings(&self) -> Result<Vec<(String, String)>> {
        let conn = self.conn.lock().await;
        super::queries::get_settings(&conn)
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_setting(&conn, key, value)
    }

    async fn delete_setting(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::delete_setting(&conn, key)
    }

    async fn try_begin_run(
        &self,
        period: Option<&str>,
        lock_timeout_secs: i64,
    ) -> Result<Option<i64>> {
        let conn = self.conn.lock().await;
        super::queries::try_begin_run(&conn, period, lock_timeout_secs)
    }

    async fn update_run_progress(&self, run_id: i64, processed: u32, failed: u32) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::update_run_progress(&conn, run_id, processed, failed)
    }

    async fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        processed: u32,
        failed: u32,
    ) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::finish_run(&conn, run_id, status, processed, failed)
    }

    async fn last_run(&self) -> Result<Option<RecalcRun>> {
        let conn = self.conn.lock().await;
        super::queries::last_run(&conn)
    }

    async fn count_share_events(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_share_events(&conn)
    }

    async fn count_coefficients(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_coefficients(&conn)
    }

    async fn count_metrics(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::count_metrics(&conn)
    }

    async fn latest_event_at(&self) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::latest_event_at(&conn)
    }
}
