use std::env;

use anyhow::Result;

/// Central configuration loaded from environment variables.
///
/// Only the database location comes from the environment. Engine tuning
/// knobs (decay factor, thresholds, page sizes) live in the
/// `engine_settings` table so an admin can change them without restarting
/// anything — see `scoring::params`.
pub struct Config {
    pub db_path: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// The .env file is loaded automatically at startup via dotenvy, so
    /// WILDFIRE_DB_PATH can live there or in the real environment.
    pub fn load() -> Result<Self> {
        Ok(Self {
            db_path: env::var("WILDFIRE_DB_PATH").unwrap_or_else(|_| "./wildfire.db".to_string()),
        })
    }
}
