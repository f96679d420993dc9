// Scheduler loop — cron-style recurring recalculation.
//
// `wildfire watch --every 1h` runs the pipeline, sleeps, and repeats.
// Parameters and platform weights are reloaded from the database each cycle
// so admin changes take effect without a restart. If another run already
// holds the lock, the cycle is skipped rather than queued. Ctrl-C during a
// run cancels at the next page boundary; Ctrl-C during the sleep exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::db::models::Period;
use crate::db::Database;
use crate::scoring::params::EngineParams;
use crate::scoring::weights::PlatformWeights;

use super::recalc::{self, RunOutcome};

/// Parse a cadence like "30s", "15m", "1h", or "2d".
pub fn parse_cadence(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.len() < 2 || !input.is_ascii() {
        bail!("Invalid cadence '{input}'. Use forms like 30s, 15m, 1h, 1d");
    }

    let (number, unit) = input.split_at(input.len() - 1);
    let number: u64 = number
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid cadence '{input}'. Use forms like 30s, 15m, 1h, 1d"))?;
    if number == 0 {
        bail!("Cadence must be positive");
    }

    let seconds = match unit {
        "s" => number,
        "m" => number * 60,
        "h" => number * 3_600,
        "d" => number * 86_400,
        _ => bail!("Invalid cadence unit '{unit}'. Use s, m, h, or d"),
    };
    Ok(Duration::from_secs(seconds))
}

fn format_cadence(every: Duration) -> String {
    let secs = every.as_secs();
    if secs % 86_400 == 0 {
        format!("{}d", secs / 86_400)
    } else if secs % 3_600 == 0 {
        format!("{}h", secs / 3_600)
    } else if secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

/// Run the scheduler loop until Ctrl-C.
pub async fn run(
    db: &Arc<dyn Database>,
    every: Duration,
    period: Option<Period>,
    concurrency: usize,
    cancel: &Arc<AtomicBool>,
) -> Result<()> {
    let cadence = format_cadence(every);
    println!("Recalculating every {cadence}. Press Ctrl-C to stop.");
    info!(every_secs = every.as_secs(), "Watch loop started");

    loop {
        if cancel.load(Ordering::Relaxed) {
            break;
        }

        // Reload knobs each cycle so admin changes apply without a restart
        let params = EngineParams::load(db).await?;
        let weights = PlatformWeights::load(db, params.min_platform_weight).await?;

        match recalc::run(db, &params, &weights, period, concurrency, cancel, Utc::now()).await {
            Ok(RunOutcome::Completed(summary)) => {
                info!(
                    run_id = summary.run_id,
                    processed = summary.items_processed,
                    failed = summary.items_failed,
                    "Cycle complete"
                );
            }
            Ok(RunOutcome::Cancelled(summary)) => {
                println!(
                    "Run cancelled after {} items. Stopping watch loop.",
                    summary.items_processed
                );
                break;
            }
            Ok(RunOutcome::AlreadyRunning) => {
                info!("Another run holds the lock, skipping this cycle");
            }
            Err(e) => {
                // One failed cycle logs and waits for the next tick
                warn!(error = %e, "Recalculation cycle failed");
            }
        }

        println!("Next recalculation in {cadence}.");
        tokio::select! {
            _ = tokio::time::sleep(every) => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\nStopping watch loop.");
                break;
            }
        }
    }
    Ok(())
}
