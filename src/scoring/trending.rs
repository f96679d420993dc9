// Trending score, growth rate, and display labels.
//
// The trending score blends the current coefficient with share-count growth
// versus the previous window. Growth is squashed through a logistic curve so
// an explosive spike saturates instead of dominating, keeping the composite
// inside 0..1 while staying monotonic in both inputs.

/// Items must score strictly above this to enter the trending list.
///
/// Distinct from the Rising label floor: content keeps its label at exactly
/// 0.5 but is excluded from the list.
pub const TRENDING_ADMISSION: f64 = 0.5;

/// Blend weights for the trending composite.
///
/// `score = coefficient_weight * clamp(coefficient, 0, 1)
///        + growth_weight * sigmoid(growth_rate / 100)`
///
/// Without a growth baseline the growth term sits at the sigmoid midpoint
/// (0.5), which neither rewards nor punishes content too new to compare.
pub struct TrendingWeights {
    /// Share of the composite carried by the coefficient (default 0.6)
    pub coefficient_weight: f64,
    /// Share carried by squashed growth (default 0.4)
    pub growth_weight: f64,
}

impl Default for TrendingWeights {
    fn default() -> Self {
        Self {
            coefficient_weight: 0.6,
            growth_weight: 0.4,
        }
    }
}

/// Percent change in share count versus the previous window.
///
/// None when the previous window had no shares: "no baseline" must stay
/// distinct from "no growth", so zero is never substituted.
pub fn growth_rate(current_count: u32, previous_count: u32) -> Option<f64> {
    if previous_count == 0 {
        return None;
    }
    let current = f64::from(current_count);
    let previous = f64::from(previous_count);
    Some((current - previous) / previous * 100.0)
}

/// Compute the 0..1 trending composite.
///
/// The final clamp keeps custom weight configurations bounded too.
pub fn trending_score(
    coefficient: f64,
    growth_rate: Option<f64>,
    weights: &TrendingWeights,
) -> f64 {
    let coefficient_term = coefficient.clamp(0.0, 1.0);
    let growth_term = match growth_rate {
        Some(rate) => sigmoid(rate / 100.0),
        None => 0.5,
    };
    let score =
        weights.coefficient_weight * coefficient_term + weights.growth_weight * growth_term;
    score.clamp(0.0, 1.0)
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Whether a score clears the admission threshold for the trending list.
pub fn admitted(score: f64) -> bool {
    score > TRENDING_ADMISSION
}

/// Display label for a trending score. Never persisted — always derived
/// from the stored score at read time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendLabel {
    Hot,
    Trending,
    Rising,
}

impl TrendLabel {
    /// >= 0.8 is Hot, >= 0.6 is Trending, everything else Rising.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            TrendLabel::Hot
        } else if score >= 0.6 {
            TrendLabel::Trending
        } else {
            TrendLabel::Rising
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrendLabel::Hot => "Hot",
            TrendLabel::Trending => "Trending",
            TrendLabel::Rising => "Rising",
        }
    }
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
