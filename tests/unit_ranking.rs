// Unit tests for reach estimation and platform performance assembly.

use wildfire::db::models::PlatformRollupRow;
use wildfire::scoring::ranking::{
    assemble_platform_performance, estimated_reach, reach_multiplier,
};

fn rollup(platform: &str, avg: f64, viral_count: u32, viral_shares: u32) -> PlatformRollupRow {
    PlatformRollupRow {
        platform: platform.to_string(),
        avg_coefficient: avg,
        viral_content_count: viral_count,
        viral_share_count: viral_shares,
    }
}

fn counts(pairs: &[(&str, u32)]) -> Vec<(String, u32)> {
    pairs.iter().map(|(p, c)| (p.to_string(), *c)).collect()
}

// ============================================================
// Reach math
// ============================================================

#[test]
fn reach_multiplier_is_coefficient_times_shares_times_scale() {
    // 0.34 * 15 * 100 = 510
    assert!((reach_multiplier(0.34, 15, 100.0) - 510.0).abs() < 1e-9);
}

#[test]
fn reach_multiplier_zero_cases() {
    assert_eq!(reach_multiplier(0.0, 500, 100.0), 0.0);
    assert_eq!(reach_multiplier(0.9, 0, 100.0), 0.0);
}

#[test]
fn reach_scale_constant_is_linear() {
    let at_100 = reach_multiplier(0.5, 10, 100.0);
    let at_250 = reach_multiplier(0.5, 10, 250.0);
    assert!((at_250 - at_100 * 2.5).abs() < 1e-9);
}

#[test]
fn estimated_reach_of_viral_slice() {
    // 40 viral shares * 0.5 avg coefficient * 100 scale = 2000
    assert!((estimated_reach(40, 0.5, 100.0) - 2000.0).abs() < 1e-9);
}

// ============================================================
// Platform performance assembly
// ============================================================

#[test]
fn assembly_merges_rollups_with_both_share_windows() {
    let rollups = vec![rollup("facebook", 0.4, 2, 30)];
    let current = counts(&[("facebook", 50)]);
    let previous = counts(&[("facebook", 25)]);

    let performance = assemble_platform_performance(&rollups, &current, &previous, 100.0);
    assert_eq!(performance.len(), 1);

    let fb = &performance[0];
    assert_eq!(fb.share_count, 50);
    assert_eq!(fb.viral_content_count, 2);
    assert_eq!(fb.avg_coefficient, Some(0.4));
    assert_eq!(fb.growth_rate, Some(100.0));
    assert!((fb.estimated_reach - 1200.0).abs() < 1e-9);
}

#[test]
fn platform_absent_from_previous_window_has_no_growth_baseline() {
    let rollups = vec![rollup("telegram", 0.2, 1, 3)];
    let current = counts(&[("telegram", 12)]);
    let previous = counts(&[("facebook", 40)]);

    let performance = assemble_platform_performance(&rollups, &current, &previous, 100.0);
    assert_eq!(performance.len(), 1);
    assert_eq!(performance[0].growth_rate, None);
}

#[test]
fn ordering_avg_desc_then_unscored_then_name() {
    let rollups = vec![
        rollup("twitter", 0.2, 1, 5),
        rollup("facebook", 0.6, 3, 40),
        rollup("reddit", 0.6, 2, 20),
    ];
    let current = counts(&[
        ("aol", 9),
        ("facebook", 50),
        ("reddit", 30),
        ("twitter", 20),
    ]);
    let previous = counts(&[]);

    let performance = assemble_platform_performance(&rollups, &current, &previous, 100.0);
    let order: Vec<&str> = performance.iter().map(|p| p.platform.as_str()).collect();

    // 0.6 tie breaks alphabetically; unscored platform sorts last
    assert_eq!(order, vec!["facebook", "reddit", "twitter", "aol"]);
}

#[test]
fn platform_with_no_coefficient_rows_reports_none_not_zero() {
    let current = counts(&[("newsletter", 7)]);
    let performance = assemble_platform_performance(&[], &current, &[], 100.0);

    let row = &performance[0];
    assert_eq!(row.avg_coefficient, None);
    assert_eq!(row.viral_content_count, 0);
    assert_eq!(row.estimated_reach, 0.0);
    assert_eq!(row.share_count, 7);
}

#[test]
fn empty_current_window_produces_empty_view() {
    let rollups = vec![rollup("facebook", 0.6, 3, 40)];
    let performance =
        assemble_platform_performance(&rollups, &[], &counts(&[("facebook", 9)]), 100.0);
    assert!(performance.is_empty());
}
