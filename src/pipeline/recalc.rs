// Batch recalculation pipeline.
//
// One run recomputes coefficient and trending rows for every content item
// with events in the lookback window (twice the period, so content aging
// out of the current window refreshes to zero instead of lingering at a
// stale high score).
//
// Strategy: page content ids in bounded batches, score each page's items in
// parallel (reads plus pure math), then upsert results sequentially. A run
// holds a single-flight lock in the recalc_runs table; cancellation is
// honored at page boundaries so no partial row is ever written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::db::models::{Period, RunStatus, ViralCoefficient, ViralMetric};
use crate::db::Database;
use crate::scoring::coefficient;
use crate::scoring::params::EngineParams;
use crate::scoring::trending::{self, TrendingWeights};
use crate::scoring::weights::PlatformWeights;

/// Counters for one accepted run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: i64,
    pub items_processed: u32,
    pub items_failed: u32,
    pub periods: Vec<Period>,
}

/// What happened when a run was triggered.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// Stopped at a page boundary; rows written so far are all consistent
    Cancelled(RunSummary),
    /// Another unfinished run holds the lock
    AlreadyRunning,
}

/// Trigger a recalculation run.
///
/// `period` limits the run to one bucket; None recomputes all of them.
/// `now` is the frozen clock for every age and window computation in the
/// run, so results are reproducible for a fixed event set.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    db: &Arc<dyn Database>,
    params: &EngineParams,
    weights: &PlatformWeights,
    period: Option<Period>,
    concurrency: usize,
    cancel: &Arc<AtomicBool>,
    now: DateTime<Utc>,
) -> Result<RunOutcome> {
    let periods: Vec<Period> = match period {
        Some(p) => vec![p],
        None => Period::ALL.to_vec(),
    };

    let run_id = match db
        .try_begin_run(period.map(|p| p.as_str()), params.run_lock_timeout_secs)
        .await?
    {
        Some(id) => id,
        None => return Ok(RunOutcome::AlreadyRunning),
    };
    info!(run_id, ?periods, "Recalculation run started");

    let mut summary = RunSummary {
        run_id,
        items_processed: 0,
        items_failed: 0,
        periods: periods.clone(),
    };

    match recalc_periods(db, params, weights, &periods, concurrency, cancel, now, &mut summary)
        .await
    {
        Ok(cancelled) => {
            let status = if cancelled {
                RunStatus::Cancelled
            } else {
                RunStatus::Completed
            };
            db.finish_run(run_id, status, summary.items_processed, summary.items_failed)
                .await?;
            info!(
                run_id,
                status = %status,
                processed = summary.items_processed,
                failed = summary.items_failed,
                "Recalculation run finished"
            );
            if cancelled {
                Ok(RunOutcome::Cancelled(summary))
            } else {
                Ok(RunOutcome::Completed(summary))
            }
        }
        Err(e) => {
            // Mark the run failed so the lock releases; surface the original error
            if let Err(finish_err) = db
                .finish_run(
                    run_id,
                    RunStatus::Failed,
                    summary.items_processed,
                    summary.items_failed,
                )
                .await
            {
                warn!(run_id, error = %finish_err, "Failed to mark run as failed");
            }
            Err(e)
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn recalc_periods(
    db: &Arc<dyn Database>,
    params: &EngineParams,
    weights: &PlatformWeights,
    periods: &[Period],
    concurrency: usize,
    cancel: &Arc<AtomicBool>,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<bool> {
    for period in periods {
        if cancel.load(Ordering::Relaxed) {
            return Ok(true);
        }
        if recalc_period(db, params, weights, *period, concurrency, cancel, now, summary).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Recompute one period bucket. Returns true if cancelled.
#[allow(clippy::too_many_arguments)]
async fn recalc_period(
    db: &Arc<dyn Database>,
    params: &EngineParams,
    weights: &PlatformWeights,
    period: Period,
    concurrency: usize,
    cancel: &Arc<AtomicBool>,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> Result<bool> {
    let window = period.window();
    let since = now - window;
    let previous_since = since - window;

    let total = db.count_distinct_content_ids(previous_since).await?;
    if total == 0 {
        info!(period = %period, "No content with recent events in period");
        return Ok(false);
    }

    println!("Recalculating {period} ({total} content items, {concurrency} concurrent)...");

    let pb = ProgressBar::new(u64::from(total));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Scoring [{bar:30}] {pos}/{len} ({eta})")
            .unwrap(),
    );

    let mut after: Option<String> = None;
    loop {
        // Page boundary: the only place cancellation takes effect
        if cancel.load(Ordering::Relaxed) {
            pb.finish_and_clear();
            return Ok(true);
        }

        let page = db
            .page_content_ids(previous_since, after.as_deref(), params.page_size)
            .await?;
        if page.is_empty() {
            break;
        }
        after = page.last().cloned();

        // Parallel map: fetch each item's windows and score them
        let results: Vec<Result<(ViralCoefficient, ViralMetric)>> =
            stream::iter(page.into_iter().map(|content_id| {
                let db = Arc::clone(db);
                async move {
                    score_content(
                        &db,
                        params,
                        weights,
                        &content_id,
                        period,
                        since,
                        previous_since,
                        now,
                    )
                    .await
                }
            }))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // Sequential reduce: upsert rows, isolating per-item failures
        for result in results {
            match result {
                Ok((coefficient_row, metric_row)) => {
                    db.upsert_coefficient(&coefficient_row).await?;
                    db.upsert_metric(&metric_row).await?;
                    summary.items_processed += 1;
                }
                Err(e) => {
                    warn!(period = %period, error = %e, "Failed to score content, skipping");
                    summary.items_failed += 1;
                }
            }
            pb.inc(1);
        }

        db.update_run_progress(summary.run_id, summary.items_processed, summary.items_failed)
            .await?;
    }
    pb.finish_and_clear();

    Ok(false)
}

/// Score one content item: current-window events against the previous
/// window's share count.
#[allow(clippy::too_many_arguments)]
async fn score_content(
    db: &Arc<dyn Database>,
    params: &EngineParams,
    weights: &PlatformWeights,
    content_id: &str,
    period: Period,
    since: DateTime<Utc>,
    previous_since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(ViralCoefficient, ViralMetric)> {
    let events = db.get_events(Some(content_id), None, since, now).await?;
    let previous_count = db.count_events(content_id, previous_since, since).await?;

    let result = coefficient::compute_coefficient(
        &events,
        weights,
        params.time_decay_factor,
        params.normalization_baseline,
        now,
    );
    let growth = trending::growth_rate(result.share_count, previous_count);
    let score = trending::trending_score(result.coefficient, growth, &TrendingWeights::default());

    Ok((
        ViralCoefficient {
            content_id: content_id.to_string(),
            period,
            viral_coefficient: result.coefficient,
            share_count: result.share_count,
            click_total: result.click_total,
            platform_breakdown: result.platform_breakdown,
            updated_at: now.to_rfc3339(),
        },
        ViralMetric {
            content_id: content_id.to_string(),
            period,
            trending_score: score,
            growth_rate: growth,
            computed_at: now.to_rfc3339(),
        },
    ))
}
