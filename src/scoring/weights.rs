// Platform amplification weights.
//
// Each sharing channel carries a multiplier reflecting how much a share
// there tends to compound: a WhatsApp forward reaches a private graph that
// reshares aggressively, a copied link mostly doesn't. Admin overrides live
// in the platform_weights table and are layered over the built-in table, so
// overriding one channel never zeroes out the rest. A platform missing from
// both gets the configured minimum rather than an error, to tolerate new
// channels appearing in the event stream before anyone configures them.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;

use crate::db::models::PlatformWeightRow;
use crate::db::Database;

/// Built-in weight table, used where the admin has configured nothing.
const DEFAULT_WEIGHTS: [(&str, f64); 9] = [
    ("copy-link", 0.3),
    ("email", 0.4),
    ("facebook", 1.0),
    ("linkedin", 0.6),
    ("pinterest", 0.5),
    ("reddit", 0.9),
    ("telegram", 0.7),
    ("twitter", 0.8),
    ("whatsapp", 1.2),
];

/// Resolved platform→weight map with a floor for unknown platforms.
#[derive(Debug, Clone)]
pub struct PlatformWeights {
    weights: HashMap<String, f64>,
    min_weight: f64,
}

impl PlatformWeights {
    /// The built-in table with the given unknown-platform floor.
    pub fn defaults(min_weight: f64) -> Self {
        let weights = DEFAULT_WEIGHTS
            .iter()
            .map(|(platform, weight)| (platform.to_string(), *weight))
            .collect();
        Self { weights, min_weight }
    }

    /// Layer configured rows over the built-in table.
    pub fn from_rows(rows: &[PlatformWeightRow], min_weight: f64) -> Self {
        let mut this = Self::defaults(min_weight);
        for row in rows {
            this.weights.insert(row.platform.to_lowercase(), row.weight);
        }
        this
    }

    /// Load the configured weights from the database.
    pub async fn load(db: &Arc<dyn Database>, min_weight: f64) -> Result<Self> {
        let rows = db.get_platform_weights().await?;
        Ok(Self::from_rows(&rows, min_weight))
    }

    /// The weight for a platform, or the minimum for anything unknown.
    /// Platforms are stored lowercase at ingestion.
    pub fn weight_for(&self, platform: &str) -> f64 {
        match self.weights.get(platform) {
            Some(weight) => *weight,
            None => self.min_weight,
        }
    }

    /// The floor applied to unknown platforms.
    pub fn min_weight(&self) -> f64 {
        self.min_weight
    }

    /// The effective (platform, weight) table, alphabetical.
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .weights
            .iter()
            .map(|(platform, weight)| (platform.clone(), *weight))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
