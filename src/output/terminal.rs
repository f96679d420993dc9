// Colored terminal output for viral rankings and platform rollups.
//
// This module handles all terminal-specific formatting: colors, tables,
// summary markers. The main.rs display paths delegate here.

use std::collections::HashSet;

use colored::Colorize;

use crate::db::models::{PlatformWeightRow, RecalcRun};
use crate::reports::{TopViralRow, TrendingRow};
use crate::scoring::params::EngineParams;
use crate::scoring::ranking::PlatformPerformance;
use crate::scoring::trending::TrendLabel;
use crate::scoring::weights::PlatformWeights;

/// Display the top-viral ranking in the terminal.
pub fn display_top_viral(rows: &[TopViralRow], period_label: &str) {
    if rows.is_empty() {
        println!("No coefficients stored yet. Run `wildfire recalc` first.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Top Viral Content for {} ({} items) ===",
            period_label,
            rows.len()
        )
        .bold()
    );
    println!();

    // Header
    println!(
        "  {:>4}  {:<32} {:>7}  {:>7}  {:>7}  {:<12} {:>9}",
        "Rank".dimmed(),
        "Content".dimmed(),
        "Coeff".dimmed(),
        "Shares".dimmed(),
        "Clicks".dimmed(),
        "Top Platform".dimmed(),
        "Reach".dimmed(),
    );
    println!("  {}", "-".repeat(90).dimmed());

    for (i, row) in rows.iter().enumerate() {
        println!(
            "  {:>4}. {:<32} {:>7.3}  {:>7}  {:>7}  {:<12} {:>9.1}",
            i + 1,
            super::truncate_chars(&row.content_id, 30),
            row.viral_coefficient,
            row.share_count,
            row.click_total,
            row.top_platform.as_deref().unwrap_or("-"),
            row.reach_multiplier,
        );
    }
    println!();
}

/// Display trending content, with a per-label summary underneath.
pub fn display_trending(rows: &[TrendingRow], period_label: &str) {
    if rows.is_empty() {
        println!("Nothing is trending for {period_label}. Run `wildfire recalc` first, or wait for more shares.");
        return;
    }

    display_metric_table(
        &format!(
            "=== Trending Content for {} ({} items) ===",
            period_label,
            rows.len()
        ),
        rows,
    );

    let hot = rows.iter().filter(|r| r.label == TrendLabel::Hot).count();
    let trending = rows
        .iter()
        .filter(|r| r.label == TrendLabel::Trending)
        .count();
    let rising = rows
        .iter()
        .filter(|r| r.label == TrendLabel::Rising)
        .count();

    if hot > 0 {
        println!("  {} {} hot", "!!".red().bold(), hot);
    }
    if trending > 0 {
        println!("  {} {} trending", "!".yellow(), trending);
    }
    if rising > 0 {
        println!("  {} {} rising", "~".green(), rising);
    }
}

/// Display content ranked by window-over-window growth.
pub fn display_growth_leaders(rows: &[TrendingRow], period_label: &str) {
    if rows.is_empty() {
        println!(
            "No growth data for {period_label} yet. Growth needs shares in the previous window."
        );
        return;
    }

    display_metric_table(
        &format!(
            "=== Growth Leaders for {} ({} items) ===",
            period_label,
            rows.len()
        ),
        rows,
    );
}

fn display_metric_table(title: &str, rows: &[TrendingRow]) {
    println!("\n{}", title.bold());
    println!();

    println!(
        "  {:>4}  {:<32} {:>6}  {:<10}  {:>8}  {:>7}  {:>7}",
        "Rank".dimmed(),
        "Content".dimmed(),
        "Score".dimmed(),
        "Label".dimmed(),
        "Growth".dimmed(),
        "Coeff".dimmed(),
        "Shares".dimmed(),
    );
    println!("  {}", "-".repeat(88).dimmed());

    for (i, row) in rows.iter().enumerate() {
        println!(
            "  {:>4}. {:<32} {:>6.2}  {:<10}  {:>8}  {:>7.3}  {:>7}",
            i + 1,
            super::truncate_chars(&row.content_id, 30),
            row.trending_score,
            colorize_label(row.label),
            format_growth(row.growth_rate),
            row.viral_coefficient,
            row.share_count,
        );
    }
    println!();
}

/// Display per-platform performance for one period window.
pub fn display_platforms(platforms: &[PlatformPerformance], period_label: &str) {
    if platforms.is_empty() {
        println!("No share events recorded for {period_label}.");
        return;
    }

    println!(
        "\n{}",
        format!(
            "=== Platform Performance for {} ({} platforms) ===",
            period_label,
            platforms.len()
        )
        .bold()
    );
    println!();

    println!(
        "  {:<14} {:>10}  {:>6}  {:>7}  {:>8}  {:>10}",
        "Platform".dimmed(),
        "Avg Coeff".dimmed(),
        "Viral".dimmed(),
        "Shares".dimmed(),
        "Growth".dimmed(),
        "Est Reach".dimmed(),
    );
    println!("  {}", "-".repeat(64).dimmed());

    for p in platforms {
        let avg = match p.avg_coefficient {
            Some(v) => format!("{v:.3}"),
            None => "-".to_string(),
        };
        println!(
            "  {:<14} {:>10}  {:>6}  {:>7}  {:>8}  {:>10.0}",
            p.platform,
            avg,
            p.viral_content_count,
            p.share_count,
            format_growth(p.growth_rate),
            p.estimated_reach,
        );
    }
    println!();
}

/// Display the effective platform weight table.
///
/// Configured rows overlay the built-in defaults, so every known platform is
/// listed with a marker showing where its weight came from.
pub fn display_weights(weights: &PlatformWeights, configured: &[PlatformWeightRow]) {
    let custom: HashSet<&str> = configured.iter().map(|r| r.platform.as_str()).collect();

    println!("\n{}", "=== Platform Weights ===".bold());
    println!();
    println!(
        "  {:<14} {:>8}  {}",
        "Platform".dimmed(),
        "Weight".dimmed(),
        "Source".dimmed(),
    );
    println!("  {}", "-".repeat(36).dimmed());

    for (platform, weight) in weights.entries() {
        let source = if custom.contains(platform.as_str()) {
            "custom".yellow()
        } else {
            "default".dimmed()
        };
        println!("  {:<14} {:>8.2}  {}", platform, weight, source);
    }

    println!();
    println!(
        "  Unlisted platforms fall back to the minimum weight {:.2}.",
        weights.min_weight()
    );
    println!();
}

/// Display the effective engine settings.
pub fn display_settings(params: &EngineParams, configured: &[(String, String)]) {
    let custom: HashSet<&str> = configured.iter().map(|(k, _)| k.as_str()).collect();

    println!("\n{}", "=== Engine Settings ===".bold());
    println!();
    println!(
        "  {:<24} {:>12}  {}",
        "Key".dimmed(),
        "Value".dimmed(),
        "Source".dimmed(),
    );
    println!("  {}", "-".repeat(50).dimmed());

    for (key, value) in params.entries() {
        let source = if custom.contains(key) {
            "custom".yellow()
        } else {
            "default".dimmed()
        };
        println!("  {:<24} {:>12}  {}", key, value, source);
    }

    // Rows the loader ignores still deserve a mention so they get cleaned up.
    let known: HashSet<&str> = params.entries().iter().map(|(k, _)| *k).collect();
    for (key, value) in configured {
        if !known.contains(key.as_str()) {
            println!(
                "  {:<24} {:>12}  {}",
                key,
                value,
                "ignored (unknown key)".red()
            );
        }
    }
    println!();
}

/// One-line summary of a recalculation run.
pub fn format_run(run: &RecalcRun) -> String {
    let scope = run.period.as_deref().unwrap_or("all periods");
    let finished = run.finished_at.as_deref().unwrap_or("still running");
    format!(
        "run #{} ({scope}) {} at {}, {} processed, {} failed, finished: {}",
        run.id, run.status, run.started_at, run.items_processed, run.items_failed, finished
    )
}

/// Colorize a trend label.
fn colorize_label(label: TrendLabel) -> colored::ColoredString {
    match label {
        TrendLabel::Hot => label.as_str().red().bold(),
        TrendLabel::Trending => label.as_str().yellow(),
        TrendLabel::Rising => label.as_str().green(),
    }
}

/// Growth formatted with an explicit sign; "n/a" when there is no baseline.
pub fn format_growth(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{rate:+.1}%"),
        None => "n/a".to_string(),
    }
}
