// Reach estimation and platform performance assembly.
//
// The orderings themselves live in SQL (queries.rs, with fully specified
// tiebreaks); this module owns the pure math layered on top of ranked rows.

use std::collections::HashMap;

use crate::db::models::PlatformRollupRow;

use super::trending;

/// Single-item reach multiplier: coefficient × shares × scale.
pub fn reach_multiplier(coefficient: f64, share_count: u32, scale_constant: f64) -> f64 {
    coefficient * f64::from(share_count) * scale_constant
}

/// Estimated reach of a platform's viral slice: viral share total ×
/// average coefficient × scale.
pub fn estimated_reach(viral_share_count: u32, avg_coefficient: f64, scale_constant: f64) -> f64 {
    f64::from(viral_share_count) * avg_coefficient * scale_constant
}

/// One platform's assembled performance view.
#[derive(Debug, Clone)]
pub struct PlatformPerformance {
    pub platform: String,
    /// None when none of the platform's window activity has a coefficient
    /// row yet (nothing recalculated); distinct from an average of 0
    pub avg_coefficient: Option<f64>,
    pub viral_content_count: u32,
    /// Raw shares on this platform in the current window
    pub share_count: u32,
    /// Share-count growth vs the previous window; None without a baseline
    pub growth_rate: Option<f64>,
    pub estimated_reach: f64,
}

/// Merge coefficient rollups with the raw per-platform share counts of the
/// current and previous windows.
///
/// Every platform with current-window activity appears. Ordered by average
/// coefficient descending (unscored platforms last), then platform name.
pub fn assemble_platform_performance(
    rollups: &[PlatformRollupRow],
    current_counts: &[(String, u32)],
    previous_counts: &[(String, u32)],
    scale_constant: f64,
) -> Vec<PlatformPerformance> {
    let rollups_by_platform: HashMap<&str, &PlatformRollupRow> = rollups
        .iter()
        .map(|row| (row.platform.as_str(), row))
        .collect();
    let previous_by_platform: HashMap<&str, u32> = previous_counts
        .iter()
        .map(|(platform, count)| (platform.as_str(), *count))
        .collect();

    let mut out: Vec<PlatformPerformance> = current_counts
        .iter()
        .map(|(platform, share_count)| {
            let rollup = rollups_by_platform.get(platform.as_str());
            let previous = previous_by_platform.get(platform.as_str()).copied().unwrap_or(0);
            let avg_coefficient = rollup.map(|r| r.avg_coefficient);
            let reach = rollup
                .map(|r| estimated_reach(r.viral_share_count, r.avg_coefficient, scale_constant))
                .unwrap_or(0.0);
            PlatformPerformance {
                platform: platform.clone(),
                avg_coefficient,
                viral_content_count: rollup.map(|r| r.viral_content_count).unwrap_or(0),
                share_count: *share_count,
                growth_rate: trending::growth_rate(*share_count, previous),
                estimated_reach: reach,
            }
        })
        .collect();

    out.sort_by(|a, b| {
        match (a.avg_coefficient, b.avg_coefficient) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.platform.cmp(&b.platform))
    });
    out
}
