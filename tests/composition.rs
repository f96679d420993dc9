// Composition tests — verifying that pure functions chain together correctly.
//
// These tests exercise the data flow between modules:
//   Share events -> Coefficient -> Growth -> Trending Score -> Label -> Report
// without any network calls or database access (except report generation,
// which writes to /tmp).

use chrono::{DateTime, Utc};

use wildfire::db::models::{RecalcRun, ShareEvent};
use wildfire::output::truncate_chars;
use wildfire::reports::{TopViralRow, TrendingRow};
use wildfire::scoring::coefficient::compute_coefficient;
use wildfire::scoring::ranking::{reach_multiplier, PlatformPerformance};
use wildfire::scoring::trending::{
    admitted, growth_rate, trending_score, TrendLabel, TrendingWeights,
};
use wildfire::scoring::weights::PlatformWeights;

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn event(content_id: &str, platform: &str, clicks: u32, created_at: DateTime<Utc>) -> ShareEvent {
    ShareEvent {
        id: 0,
        content_id: content_id.to_string(),
        content_type: "post".to_string(),
        platform: platform.to_string(),
        user_id: None,
        click_count: clicks,
        created_at,
    }
}

// ============================================================
// Chain: events -> coefficient -> trending score -> label
// ============================================================

#[test]
fn viral_spike_chains_to_hot_label() {
    let now = ts("2026-03-10T12:00:00Z");

    // Heavy fresh activity: 30 Facebook shares with 2 clicks each -> raw 90
    let events: Vec<ShareEvent> = (0..30)
        .map(|_| event("post:spike", "facebook", 2, now))
        .collect();

    let weights = PlatformWeights::defaults(0.1);
    let result = compute_coefficient(&events, &weights, 0.01, 100.0, now);
    assert!((result.coefficient - 0.9).abs() < 1e-9);

    // Shares quadrupled since the previous window
    let growth = growth_rate(result.share_count, 7);
    let score = trending_score(result.coefficient, growth, &TrendingWeights::default());

    // 0.6*0.9 + 0.4*sigmoid(3.28...) comfortably clears 0.8
    assert!(score > 0.8, "Expected a hot score, got {score}");
    assert_eq!(TrendLabel::from_score(score), TrendLabel::Hot);
    assert!(admitted(score));
}

#[test]
fn quiet_content_chains_to_unlisted_rising() {
    let now = ts("2026-03-10T12:00:00Z");

    // A couple of aging low-weight shares
    let events = vec![
        event("post:quiet", "copy-link", 0, ts("2026-03-05T12:00:00Z")),
        event("post:quiet", "email", 0, ts("2026-03-06T12:00:00Z")),
    ];

    let weights = PlatformWeights::defaults(0.1);
    let result = compute_coefficient(&events, &weights, 0.01, 100.0, now);
    assert!(result.coefficient < 0.01);

    // Same share count as last window: flat growth
    let growth = growth_rate(result.share_count, 2);
    assert_eq!(growth, Some(0.0));

    let score = trending_score(result.coefficient, growth, &TrendingWeights::default());
    assert_eq!(TrendLabel::from_score(score), TrendLabel::Rising);
    assert!(!admitted(score), "Quiet content must not be listed, got {score}");
}

#[test]
fn brand_new_content_gets_neutral_growth_treatment() {
    let now = ts("2026-03-10T12:00:00Z");
    let events: Vec<ShareEvent> = (0..20)
        .map(|_| event("post:new", "whatsapp", 1, now))
        .collect();

    let weights = PlatformWeights::defaults(0.1);
    let result = compute_coefficient(&events, &weights, 0.01, 100.0, now);

    // No previous window: growth is None, the score's growth term is neutral
    let growth = growth_rate(result.share_count, 0);
    assert_eq!(growth, None);

    let score = trending_score(result.coefficient, growth, &TrendingWeights::default());
    let with_flat_growth =
        trending_score(result.coefficient, Some(0.0), &TrendingWeights::default());
    assert!(
        (score - with_flat_growth).abs() < f64::EPSILON,
        "No-baseline and flat-growth must score the same"
    );
}

// ============================================================
// Chain: coefficient -> reach in report rows
// ============================================================

#[test]
fn reach_multiplier_tracks_coefficient_and_shares() {
    let now = ts("2026-03-10T12:00:00Z");
    let mut events: Vec<ShareEvent> = (0..10)
        .map(|_| event("post:reach", "facebook", 2, now))
        .collect();
    events.extend((0..5).map(|_| event("post:reach", "twitter", 0, now)));

    let weights = PlatformWeights::defaults(0.1);
    let result = compute_coefficient(&events, &weights, 0.01, 100.0, now);

    // 0.34 * 15 * 100 = 510
    let reach = reach_multiplier(result.coefficient, result.share_count, 100.0);
    assert!((reach - 510.0).abs() < 1e-6);
}

// ============================================================
// Chain: report generation with synthesized data
// ============================================================

fn top_row(content_id: &str, coefficient: f64, shares: u32) -> TopViralRow {
    TopViralRow {
        content_id: content_id.to_string(),
        viral_coefficient: coefficient,
        share_count: shares,
        click_total: shares / 2,
        top_platform: Some("facebook".to_string()),
        reach_multiplier: reach_multiplier(coefficient, shares, 100.0),
    }
}

fn trending_row(content_id: &str, score: f64, growth: Option<f64>) -> TrendingRow {
    TrendingRow {
        content_id: content_id.to_string(),
        trending_score: score,
        label: TrendLabel::from_score(score),
        growth_rate: growth,
        viral_coefficient: 0.4,
        share_count: 12,
    }
}

#[test]
fn report_includes_all_label_counts() {
    let trending = vec![
        trending_row("post:hot", 0.85, Some(300.0)),
        trending_row("post:trending", 0.65, Some(80.0)),
        trending_row("post:rising-a", 0.55, Some(20.0)),
        trending_row("post:rising-b", 0.52, None),
    ];

    let tmp_path = "/tmp/wildfire_test_all_labels.md";
    let result = wildfire::output::markdown::generate_report(
        "7days",
        &[],
        &trending,
        &[],
        &[],
        None,
        tmp_path,
    );
    assert!(result.is_ok());

    let content = std::fs::read_to_string(tmp_path).unwrap();
    assert!(content.contains("| Hot | 1 |"));
    assert!(content.contains("| Trending | 1 |"));
    assert!(content.contains("| Rising | 2 |"));
    assert!(content.contains("| **Listed** | **4** |"));

    let _ = std::fs::remove_file(tmp_path);
}

#[test]
fn report_empty_data_still_has_summary() {
    let tmp_path = "/tmp/wildfire_test_empty_report.md";
    let result = wildfire::output::markdown::generate_report(
        "7days",
        &[],
        &[],
        &[],
        &[],
        None,
        tmp_path,
    );
    assert!(result.is_ok());

    let content = std::fs::read_to_string(tmp_path).unwrap();
    assert!(content.contains("# Wildfire Viral Report"));
    assert!(content.contains("| **Listed** | **0** |"));
    // Empty sections are omitted entirely
    assert!(!content.contains("## Top Viral Content"));
    assert!(!content.contains("## Trending Content"));
    assert!(!content.contains("## Platform Performance"));
    assert!(!content.contains("## Last Recalculation"));

    let _ = std::fs::remove_file(tmp_path);
}

#[test]
fn report_includes_top_viral_section() {
    let top = vec![
        top_row("post:first", 0.72, 40),
        top_row("post:second", 0.34, 15),
    ];

    let tmp_path = "/tmp/wildfire_test_top_section.md";
    let result = wildfire::output::markdown::generate_report(
        "30days",
        &top,
        &[],
        &[],
        &[],
        None,
        tmp_path,
    );
    assert!(result.is_ok());

    let content = std::fs::read_to_string(tmp_path).unwrap();
    assert!(content.contains("## Top Viral Content"));
    assert!(content.contains("post:first"));
    assert!(content.contains("0.720"));
    assert!(content.contains("Window: 30days"));

    let _ = std::fs::remove_file(tmp_path);
}

#[test]
fn report_escapes_pipe_in_content_id() {
    let top = vec![top_row("post|with|pipes", 0.5, 10)];

    let tmp_path = "/tmp/wildfire_test_pipe_escape.md";
    let result = wildfire::output::markdown::generate_report(
        "7days",
        &top,
        &[],
        &[],
        &[],
        None,
        tmp_path,
    );
    assert!(result.is_ok());

    let content = std::fs::read_to_string(tmp_path).unwrap();
    assert!(
        content.contains("\\|"),
        "Pipe chars should be escaped in markdown tables"
    );

    let _ = std::fs::remove_file(tmp_path);
}

#[test]
fn report_growth_column_shows_na_without_baseline() {
    let trending = vec![trending_row("post:fresh", 0.7, None)];

    let tmp_path = "/tmp/wildfire_test_growth_na.md";
    let result = wildfire::output::markdown::generate_report(
        "1day",
        &[],
        &trending,
        &[],
        &[],
        None,
        tmp_path,
    );
    assert!(result.is_ok());

    let content = std::fs::read_to_string(tmp_path).unwrap();
    assert!(content.contains("| n/a |"));

    let _ = std::fs::remove_file(tmp_path);
}

#[test]
fn report_includes_platform_section() {
    let platforms = vec![PlatformPerformance {
        platform: "facebook".to_string(),
        avg_coefficient: Some(0.41),
        viral_content_count: 3,
        share_count: 120,
        growth_rate: Some(33.3),
        estimated_reach: 4500.0,
    }];

    let tmp_path = "/tmp/wildfire_test_platform_section.md";
    let result = wildfire::output::markdown::generate_report(
        "7days",
        &[],
        &[],
        &[],
        &platforms,
        None,
        tmp_path,
    );
    assert!(result.is_ok());

    let content = std::fs::read_to_string(tmp_path).unwrap();
    assert!(content.contains("## Platform Performance"));
    assert!(content.contains("facebook"));
    assert!(content.contains("+33.3%"));

    let _ = std::fs::remove_file(tmp_path);
}

#[test]
fn report_includes_last_run_section() {
    let run = RecalcRun {
        id: 12,
        period: Some("7days".to_string()),
        status: "completed".to_string(),
        items_processed: 240,
        items_failed: 1,
        started_at: "2026-03-10 11:58:02".to_string(),
        finished_at: Some("2026-03-10 11:59:40".to_string()),
    };

    let tmp_path = "/tmp/wildfire_test_last_run.md";
    let result = wildfire::output::markdown::generate_report(
        "7days",
        &[],
        &[],
        &[],
        &[],
        Some(&run),
        tmp_path,
    );
    assert!(result.is_ok());

    let content = std::fs::read_to_string(tmp_path).unwrap();
    assert!(content.contains("## Last Recalculation"));
    assert!(content.contains("Run #12"));
    assert!(content.contains("240 processed, 1 failed"));

    let _ = std::fs::remove_file(tmp_path);
}

// ============================================================
// Chain: truncate_chars in report context
// ============================================================

#[test]
fn truncation_works_in_report_pipeline() {
    let long_id = "a".repeat(200);
    let truncated = truncate_chars(&long_id, 100);
    assert_eq!(truncated.chars().count(), 103); // 100 + "..."
    assert!(truncated.ends_with("..."));
}

#[test]
fn long_content_id_is_truncated_in_report_table() {
    let long_id = format!("post:{}", "x".repeat(150));
    let top = vec![top_row(&long_id, 0.6, 20)];

    let tmp_path = "/tmp/wildfire_test_truncated_id.md";
    let result = wildfire::output::markdown::generate_report(
        "7days",
        &top,
        &[],
        &[],
        &[],
        None,
        tmp_path,
    );
    assert!(result.is_ok());

    let content = std::fs::read_to_string(tmp_path).unwrap();
    assert!(!content.contains(&long_id), "Full 155-char id should not appear");
    assert!(content.contains("..."), "Truncation marker expected");

    let _ = std::fs::remove_file(tmp_path);
}
