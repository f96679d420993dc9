// System status display — shows DB stats, stored score counts, last run.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;
use crate::output::terminal;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    if !Path::new(db_display_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `wildfire init` to set up the database.");
        return Ok(());
    }

    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    // Share events
    let event_count = db.count_share_events().await?;
    if event_count == 0 {
        println!("Share events: none recorded yet");
        println!("  Run `wildfire record` or `wildfire import` to add some");
    } else {
        match db.latest_event_at().await? {
            Some(latest) => {
                println!("Share events: {} total, latest at {}", event_count, latest)
            }
            None => println!("Share events: {} total", event_count),
        }
    }

    // Stored scores
    let coefficient_count = db.count_coefficients().await?;
    let metric_count = db.count_metrics().await?;
    println!(
        "Stored scores: {} coefficients, {} trending metrics",
        coefficient_count, metric_count
    );

    // Configuration overrides
    let weights = db.get_platform_weights().await?;
    let settings = db.get_settings().await?;
    println!(
        "Overrides: {} platform weights, {} engine settings",
        weights.len(),
        settings.len()
    );

    // Last recalculation
    match db.last_run().await? {
        Some(run) => println!("Last recalculation: {}", terminal::format_run(&run)),
        None => {
            println!("Last recalculation: never");
            println!("  Run `wildfire recalc` to score recorded shares");
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
