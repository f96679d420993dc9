// Engine parameters — the tunable knobs of the scoring formulas.
//
// Values live in the engine_settings table as strings so admins can adjust
// them without a redeploy. Loading is tolerant: an invalid override is
// logged and the default kept, because a bad setting must never take the
// recalculation pipeline down. `wildfire config set` validates eagerly so
// bad values are rejected before they ever land in the table.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::warn;

use crate::db::Database;

/// Setting keys recognized in the engine_settings table.
pub const KNOWN_KEYS: [&str; 7] = [
    "time_decay_factor",
    "normalization_baseline",
    "min_platform_weight",
    "viral_threshold",
    "scale_constant",
    "page_size",
    "run_lock_timeout_secs",
];

/// Tunable parameters for the scoring formulas and the pipeline.
#[derive(Debug, Clone)]
pub struct EngineParams {
    /// Per-day exponential decay on each event's contribution (default 0.01,
    /// shrinking a contribution about 1% per day of age)
    pub time_decay_factor: f64,
    /// Raw weighted totals are divided by this to land coefficients in a
    /// comparable 0..1-ish range (default 100.0)
    pub normalization_baseline: f64,
    /// Weight applied to platforms missing from the weight table (default 0.1)
    pub min_platform_weight: f64,
    /// Coefficient at or above this counts as viral in rollups (default 0.3)
    pub viral_threshold: f64,
    /// Calibration constant for reach estimates (default 100.0)
    pub scale_constant: f64,
    /// Content ids fetched per pipeline batch (default 200)
    pub page_size: u32,
    /// Seconds before an unfinished run lock counts as abandoned (default 3600)
    pub run_lock_timeout_secs: i64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            time_decay_factor: 0.01,
            normalization_baseline: 100.0,
            min_platform_weight: 0.1,
            viral_threshold: 0.3,
            scale_constant: 100.0,
            page_size: 200,
            run_lock_timeout_secs: 3600,
        }
    }
}

impl EngineParams {
    /// Build params from engine_settings rows.
    ///
    /// Each invalid override is dropped individually — one bad row never
    /// poisons the rest of the configuration.
    pub fn from_settings(settings: &[(String, String)]) -> Self {
        let mut params = Self::default();
        for (key, value) in settings {
            if let Err(e) = params.apply(key, value) {
                warn!(key, value, error = %e, "Ignoring invalid engine setting");
            }
        }
        params
    }

    /// Load the current parameters from the database.
    pub async fn load(db: &Arc<dyn Database>) -> Result<Self> {
        let settings = db.get_settings().await?;
        Ok(Self::from_settings(&settings))
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "time_decay_factor" => {
                let v = parse_f64(value)?;
                if v < 0.0 {
                    bail!("time_decay_factor must be >= 0");
                }
                self.time_decay_factor = v;
            }
            "normalization_baseline" => {
                let v = parse_f64(value)?;
                if v <= 0.0 {
                    bail!("normalization_baseline must be > 0");
                }
                self.normalization_baseline = v;
            }
            "min_platform_weight" => {
                let v = parse_f64(value)?;
                if v <= 0.0 {
                    bail!("min_platform_weight must be > 0");
                }
                self.min_platform_weight = v;
            }
            "viral_threshold" => {
                let v = parse_f64(value)?;
                if !(0.0..=1.0).contains(&v) {
                    bail!("viral_threshold must be between 0 and 1");
                }
                self.viral_threshold = v;
            }
            "scale_constant" => {
                let v = parse_f64(value)?;
                if v <= 0.0 {
                    bail!("scale_constant must be > 0");
                }
                self.scale_constant = v;
            }
            "page_size" => {
                let v: u32 = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("page_size must be a positive integer"))?;
                if v == 0 {
                    bail!("page_size must be >= 1");
                }
                self.page_size = v;
            }
            "run_lock_timeout_secs" => {
                let v: i64 = value.parse().map_err(|_| {
                    anyhow::anyhow!("run_lock_timeout_secs must be a positive integer")
                })?;
                if v < 1 {
                    bail!("run_lock_timeout_secs must be >= 1");
                }
                self.run_lock_timeout_secs = v;
            }
            _ => bail!(
                "Unknown setting '{key}'. Valid keys: {}",
                KNOWN_KEYS.join(", ")
            ),
        }
        Ok(())
    }

    /// Effective values as (key, value) strings in `KNOWN_KEYS` order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("time_decay_factor", self.time_decay_factor.to_string()),
            (
                "normalization_baseline",
                self.normalization_baseline.to_string(),
            ),
            ("min_platform_weight", self.min_platform_weight.to_string()),
            ("viral_threshold", self.viral_threshold.to_string()),
            ("scale_constant", self.scale_constant.to_string()),
            ("page_size", self.page_size.to_string()),
            (
                "run_lock_timeout_secs",
                self.run_lock_timeout_secs.to_string(),
            ),
        ]
    }
}

/// Validate a key/value pair before writing it with `config set`.
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    EngineParams::default().apply(key, value)
}

fn parse_f64(value: &str) -> Result<f64> {
    let v: f64 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("not a number"))?;
    if !v.is_finite() {
        bail!("not a finite number");
    }
    Ok(v)
}
