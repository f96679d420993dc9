// Wildfire: viral coefficient and trending engine for shared content.
//
// This is the library root. Each module corresponds to a major subsystem
// of the recalculation pipeline.

pub mod config;
pub mod db;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod reports;
pub mod scoring;
pub mod status;
