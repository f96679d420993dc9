// Markdown report generation.
//
// Writes a standalone snapshot of the current rankings so results can be
// shared outside the terminal. All table cells go through escape_pipes so
// user-supplied content ids cannot break the table layout.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::db::models::RecalcRun;
use crate::reports::{TopViralRow, TrendingRow};
use crate::scoring::ranking::PlatformPerformance;
use crate::scoring::trending::TrendLabel;

use super::terminal::format_growth;
use super::truncate_chars;

/// Generate a markdown report and return the path it was written to.
///
/// Sections with nothing to show are omitted entirely; the label summary is
/// always present so an empty report still reads as a result, not a failure.
pub fn generate_report(
    period_label: &str,
    top: &[TopViralRow],
    trending: &[TrendingRow],
    growth: &[TrendingRow],
    platforms: &[PlatformPerformance],
    last_run: Option<&RecalcRun>,
    path: &str,
) -> Result<String> {
    let mut md = String::new();

    md.push_str("# Wildfire Viral Report\n\n");
    md.push_str(&format!(
        "Generated: {}\n",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    ));
    md.push_str(&format!("Window: {period_label}\n\n"));

    md.push_str("## Summary\n\n");
    md.push_str("| Label | Count |\n");
    md.push_str("|-------|-------|\n");
    for label in [TrendLabel::Hot, TrendLabel::Trending, TrendLabel::Rising] {
        let count = trending.iter().filter(|r| r.label == label).count();
        md.push_str(&format!("| {} | {} |\n", label.as_str(), count));
    }
    md.push_str(&format!("| **Listed** | **{}** |\n\n", trending.len()));

    if !top.is_empty() {
        md.push_str("## Top Viral Content\n\n");
        md.push_str("| # | Content | Coefficient | Shares | Clicks | Top Platform | Reach |\n");
        md.push_str("|---|---------|-------------|--------|--------|--------------|-------|\n");
        for (i, row) in top.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {:.3} | {} | {} | {} | {:.1} |\n",
                i + 1,
                escape_pipes(&truncate_chars(&row.content_id, 60)),
                row.viral_coefficient,
                row.share_count,
                row.click_total,
                escape_pipes(row.top_platform.as_deref().unwrap_or("-")),
                row.reach_multiplier,
            ));
        }
        md.push('\n');
    }

    if !trending.is_empty() {
        md.push_str("## Trending Content\n\n");
        push_metric_table(&mut md, trending);
    }

    if !growth.is_empty() {
        md.push_str("## Growth Leaders\n\n");
        push_metric_table(&mut md, growth);
    }

    if !platforms.is_empty() {
        md.push_str("## Platform Performance\n\n");
        md.push_str("| Platform | Avg Coefficient | Viral Content | Shares | Growth | Est. Reach |\n");
        md.push_str("|----------|-----------------|---------------|--------|--------|------------|\n");
        for p in platforms {
            let avg = match p.avg_coefficient {
                Some(v) => format!("{v:.3}"),
                None => "-".to_string(),
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {:.0} |\n",
                escape_pipes(&p.platform),
                avg,
                p.viral_content_count,
                p.share_count,
                format_growth(p.growth_rate),
                p.estimated_reach,
            ));
        }
        md.push('\n');
    }

    if let Some(run) = last_run {
        md.push_str("## Last Recalculation\n\n");
        md.push_str(&format!(
            "- Run #{} ({})\n",
            run.id,
            run.period.as_deref().unwrap_or("all periods")
        ));
        md.push_str(&format!("- Status: {}\n", run.status));
        md.push_str(&format!(
            "- Items: {} processed, {} failed\n",
            run.items_processed, run.items_failed
        ));
        md.push_str(&format!(
            "- Started: {}, finished: {}\n",
            run.started_at,
            run.finished_at.as_deref().unwrap_or("still running")
        ));
        md.push('\n');
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory {}", parent.display())
            })?;
        }
    }
    std::fs::write(path, md).with_context(|| format!("Failed to write report to {path}"))?;

    Ok(path.to_string())
}

fn push_metric_table(md: &mut String, rows: &[TrendingRow]) {
    md.push_str("| # | Content | Score | Label | Growth | Coefficient | Shares |\n");
    md.push_str("|---|---------|-------|-------|--------|-------------|--------|\n");
    for (i, row) in rows.iter().enumerate() {
        md.push_str(&format!(
            "| {} | {} | {:.2} | {} | {} | {:.3} | {} |\n",
            i + 1,
            escape_pipes(&truncate_chars(&row.content_id, 60)),
            row.trending_score,
            row.label.as_str(),
            format_growth(row.growth_rate),
            row.viral_coefficient,
            row.share_count,
        ));
    }
    md.push('\n');
}

fn escape_pipes(text: &str) -> String {
    text.replace('|', "\\|")
}
