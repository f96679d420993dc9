// Reporting views — the read side of the engine.
//
// Assembles ranked rows from the database together with the display fields
// derived at read time (labels, reach estimates). Nothing here recomputes
// scores; it decorates what the last run stored.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::db::models::{Period, ViralCoefficient, ViralMetric};
use crate::db::Database;
use crate::scoring::params::EngineParams;
use crate::scoring::ranking::{self, PlatformPerformance};
use crate::scoring::trending::{TrendLabel, TRENDING_ADMISSION};

/// One row of the top-viral view.
#[derive(Debug, Clone)]
pub struct TopViralRow {
    pub content_id: String,
    pub viral_coefficient: f64,
    pub share_count: u32,
    pub click_total: u32,
    /// Platform with the largest decayed contribution, if any
    pub top_platform: Option<String>,
    pub reach_multiplier: f64,
}

/// One row of the trending and growth-leader views.
#[derive(Debug, Clone)]
pub struct TrendingRow {
    pub content_id: String,
    pub trending_score: f64,
    pub label: TrendLabel,
    pub growth_rate: Option<f64>,
    pub viral_coefficient: f64,
    pub share_count: u32,
}

/// Top content by coefficient, decorated with reach and leading platform.
pub async fn top_viral_content(
    db: &Arc<dyn Database>,
    params: &EngineParams,
    period: Period,
    limit: u32,
    offset: u32,
) -> Result<Vec<TopViralRow>> {
    let rows = db.top_viral(period, limit, offset).await?;
    Ok(rows
        .into_iter()
        .map(|row| decorate_top_row(row, params.scale_constant))
        .collect())
}

/// Content strictly above the trending admission threshold.
pub async fn trending_content(
    db: &Arc<dyn Database>,
    period: Period,
    limit: u32,
) -> Result<Vec<TrendingRow>> {
    let rows = db.trending(period, TRENDING_ADMISSION, limit).await?;
    Ok(rows.into_iter().map(to_trending_row).collect())
}

/// Content ranked by growth rate. Items without a baseline are absent, not
/// last — there is no rate to sort them by.
pub async fn growth_leaders(
    db: &Arc<dyn Database>,
    period: Period,
    limit: u32,
) -> Result<Vec<TrendingRow>> {
    let rows = db.growth_leaders(period, limit).await?;
    Ok(rows.into_iter().map(to_trending_row).collect())
}

/// Per-platform rollup for the period window ending at `now`.
pub async fn platform_performance(
    db: &Arc<dyn Database>,
    params: &EngineParams,
    period: Period,
    now: DateTime<Utc>,
) -> Result<Vec<PlatformPerformance>> {
    let window = period.window();
    let since = now - window;
    let previous_since = since - window;

    let rollups = db
        .platform_coefficient_rollup(period, since, now, params.viral_threshold)
        .await?;
    let current = db.platform_share_counts(since, now).await?;
    let previous = db.platform_share_counts(previous_since, since).await?;

    Ok(ranking::assemble_platform_performance(
        &rollups,
        &current,
        &previous,
        params.scale_constant,
    ))
}

fn decorate_top_row(row: ViralCoefficient, scale_constant: f64) -> TopViralRow {
    let top_platform = top_platform(&row.platform_breakdown);
    TopViralRow {
        reach_multiplier: ranking::reach_multiplier(
            row.viral_coefficient,
            row.share_count,
            scale_constant,
        ),
        content_id: row.content_id,
        viral_coefficient: row.viral_coefficient,
        share_count: row.share_count,
        click_total: row.click_total,
        top_platform,
    }
}

fn to_trending_row((metric, coefficient, share_count): (ViralMetric, f64, u32)) -> TrendingRow {
    TrendingRow {
        label: TrendLabel::from_score(metric.trending_score),
        content_id: metric.content_id,
        trending_score: metric.trending_score,
        growth_rate: metric.growth_rate,
        viral_coefficient: coefficient,
        share_count,
    }
}

/// The platform with the largest contribution; name breaks ties (the map
/// iterates alphabetically, and only a strictly larger value replaces).
fn top_platform(breakdown: &BTreeMap<String, f64>) -> Option<String> {
    let mut best: Option<(&str, f64)> = None;
    for (platform, value) in breakdown {
        match best {
            Some((_, best_value)) if *value <= best_value => {}
            _ => best = Some((platform, *value)),
        }
    }
    best.map(|(platform, _)| platform.to_string())
}
