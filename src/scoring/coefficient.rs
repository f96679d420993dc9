// Viral coefficient formula.
//
// Each share event contributes `platform_weight * (1 + clicks)`, decayed
// exponentially by the event's own age. Contributions are summed and divided
// by the normalization baseline. Decay is applied per event, not once to the
// sum: a week-old share and a fresh share age independently, which keeps the
// result stable when a window is reprocessed after new events arrive.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::weights::PlatformWeights;
use crate::db::models::ShareEvent;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// The computed coefficient for one (content_id, period) window, plus the
/// aggregates the reporting views need.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientResult {
    /// Normalized score, never negative
    pub coefficient: f64,
    pub share_count: u32,
    pub click_total: u32,
    /// Decayed weighted total before normalization
    pub weighted_total: f64,
    /// Per-platform slice of the weighted total
    pub platform_breakdown: BTreeMap<String, f64>,
}

/// Compute the viral coefficient for one content item's window of events.
///
/// Deterministic for a frozen `now`; an empty window yields a zero result,
/// not an error. Events stamped in the future count as age 0 instead of
/// inflating the score with a decay factor above 1.
pub fn compute_coefficient(
    events: &[ShareEvent],
    weights: &PlatformWeights,
    decay_factor: f64,
    normalization_baseline: f64,
    now: DateTime<Utc>,
) -> CoefficientResult {
    let mut weighted_total = 0.0;
    let mut click_total: u32 = 0;
    let mut platform_breakdown: BTreeMap<String, f64> = BTreeMap::new();

    for event in events {
        let weight = weights.weight_for(&event.platform);
        let contribution = weight * (1.0 + f64::from(event.click_count));

        let age_secs = (now - event.created_at).num_seconds() as f64;
        let age_days = (age_secs / SECONDS_PER_DAY).max(0.0);
        let decayed = contribution * (-decay_factor * age_days).exp();

        weighted_total += decayed;
        click_total += event.click_count;
        *platform_breakdown
            .entry(event.platform.clone())
            .or_insert(0.0) += decayed;
    }

    let coefficient = (weighted_total / normalization_baseline).max(0.0);

    CoefficientResult {
        coefficient,
        share_count: events.len() as u32,
        click_total,
        weighted_total,
        platform_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn event(platform: &str, clicks: u32, created_at: DateTime<Utc>) -> ShareEvent {
        ShareEvent {
            id: 0,
            content_id: "post:1".to_string(),
            content_type: "post".to_string(),
            platform: platform.to_string(),
            user_id: None,
            click_count: clicks,
            created_at,
        }
    }

    #[test]
    fn test_facebook_twitter_mix() {
        let now = ts("2026-03-10T12:00:00Z");
        let mut events = Vec::new();
        // 10 Facebook shares with 2 clicks each: 10 * 1.0*(1+2) = 30
        for _ in 0..10 {
            events.push(event("facebook", 2, now));
        }
        // 5 Twitter shares with no clicks: 5 * 0.8*(1+0) = 4
        for _ in 0..5 {
            events.push(event("twitter", 0, now));
        }

        let weights = PlatformWeights::defaults(0.1);
        let result = compute_coefficient(&events, &weights, 0.01, 100.0, now);

        // Raw sum 34 over baseline 100
        assert!((result.weighted_total - 34.0).abs() < 1e-9);
        assert!((result.coefficient - 0.34).abs() < 1e-9);
        assert_eq!(result.share_count, 15);
        assert_eq!(result.click_total, 20);
        assert!((result.platform_breakdown["facebook"] - 30.0).abs() < 1e-9);
        assert!((result.platform_breakdown["twitter"] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_events_zero() {
        let now = ts("2026-03-10T12:00:00Z");
        let weights = PlatformWeights::defaults(0.1);
        let result = compute_coefficient(&[], &weights, 0.01, 100.0, now);
        assert!((result.coefficient - 0.0).abs() < f64::EPSILON);
        assert_eq!(result.share_count, 0);
        assert!(result.platform_breakdown.is_empty());
    }

    #[test]
    fn test_one_day_decay() {
        let now = ts("2026-03-10T12:00:00Z");
        let yesterday = ts("2026-03-09T12:00:00Z");
        let mut events = Vec::new();
        for _ in 0..10 {
            events.push(event("facebook", 2, yesterday));
        }
        for _ in 0..5 {
            events.push(event("twitter", 0, yesterday));
        }

        let weights = PlatformWeights::defaults(0.1);
        let result = compute_coefficient(&events, &weights, 0.01, 100.0, now);

        // All events aged exactly one day: 0.34 * e^-0.01 ≈ 0.336617
        let expected = 0.34 * (-0.01_f64).exp();
        assert!(
            (result.coefficient - expected).abs() < 1e-9,
            "Expected ~{expected}, got {}",
            result.coefficient
        );
    }

    #[test]
    fn test_older_events_contribute_less() {
        let now = ts("2026-03-10T12:00:00Z");
        let weights = PlatformWeights::defaults(0.1);

        let fresh = compute_coefficient(&[event("facebook", 0, now)], &weights, 0.01, 100.0, now);
        let day_old = compute_coefficient(
            &[event("facebook", 0, ts("2026-03-09T12:00:00Z"))],
            &weights,
            0.01,
            100.0,
            now,
        );
        let week_old = compute_coefficient(
            &[event("facebook", 0, ts("2026-03-03T12:00:00Z"))],
            &weights,
            0.01,
            100.0,
            now,
        );

        assert!(fresh.coefficient > day_old.coefficient);
        assert!(day_old.coefficient > week_old.coefficient);
        assert!(week_old.coefficient > 0.0);
    }

    #[test]
    fn test_unknown_platform_floor() {
        let now = ts("2026-03-10T12:00:00Z");
        let weights = PlatformWeights::defaults(0.1);
        let result =
            compute_coefficient(&[event("myspace", 0, now)], &weights, 0.01, 100.0, now);
        // 0.1 * (1+0) / 100
        assert!((result.coefficient - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_future_event_age_clamped() {
        let now = ts("2026-03-10T12:00:00Z");
        let tomorrow = ts("2026-03-11T12:00:00Z");
        let weights = PlatformWeights::defaults(0.1);
        let result =
            compute_coefficient(&[event("facebook", 0, tomorrow)], &weights, 0.01, 100.0, now);
        // Age clamps to 0, so no decay and no amplification
        assert!((result.coefficient - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let now = ts("2026-03-10T12:00:00Z");
        let events = vec![
            event("facebook", 3, ts("2026-03-08T00:00:00Z")),
            event("twitter", 1, ts("2026-03-09T06:30:00Z")),
            event("whatsapp", 0, ts("2026-03-10T01:15:00Z")),
            event("facebook", 0, ts("2026-03-10T11:00:00Z")),
        ];
        let weights = PlatformWeights::defaults(0.1);
        let result = compute_coefficient(&events, &weights, 0.01, 100.0, now);

        let breakdown_sum: f64 = result.platform_breakdown.values().sum();
        assert!((breakdown_sum - result.weighted_total).abs() < 1e-9);
    }

    #[test]
    fn test_determinism() {
        let now = ts("2026-03-10T12:00:00Z");
        let events = vec![
            event("facebook", 2, ts("2026-03-07T09:00:00Z")),
            event("reddit", 5, ts("2026-03-09T21:45:00Z")),
        ];
        let weights = PlatformWeights::defaults(0.1);
        let a = compute_coefficient(&events, &weights, 0.01, 100.0, now);
        let b = compute_coefficient(&events, &weights, 0.01, 100.0, now);
        assert_eq!(a.coefficient.to_bits(), b.coefficient.to_bits());
    }
}
