// Share event ingestion — validation, normalization, and JSONL import.
//
// This is the only place share events are written. Single records validate
// strictly (an operator typo should fail loudly); bulk import logs and skips
// bad lines so one malformed row never aborts a backfill.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::db::models::NewShareEvent;
use crate::db::Database;

/// Outcome of a JSONL import.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: u32,
    pub skipped: u32,
}

/// Validate and record a single share event. Returns the stored event id.
pub async fn record(db: &Arc<dyn Database>, event: NewShareEvent) -> Result<i64> {
    let event = normalize(event)?;
    db.insert_share_event(&event).await
}

/// Trim identifiers, lowercase the platform, and reject empties.
///
/// Platforms are lowercased here so weight lookups and rollups never split
/// one channel into "Facebook" and "facebook".
fn normalize(mut event: NewShareEvent) -> Result<NewShareEvent> {
    event.content_id = event.content_id.trim().to_string();
    event.platform = event.platform.trim().to_lowercase();
    event.content_type = event.content_type.trim().to_string();

    if event.content_id.is_empty() {
        bail!("content_id must not be empty");
    }
    if event.platform.is_empty() {
        bail!("platform must not be empty");
    }
    if event.content_type.is_empty() {
        bail!("content_type must not be empty");
    }
    Ok(event)
}

/// Import newline-delimited JSON events from a file.
///
/// Each line is one event object; only `content_id` and `platform` are
/// required. Malformed or invalid lines are logged and skipped, blank lines
/// ignored. A database write failure still aborts — skipping is for bad
/// data, not for broken storage.
pub async fn import_jsonl(db: &Arc<dyn Database>, path: &Path) -> Result<ImportSummary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut summary = ImportSummary::default();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed: NewShareEvent = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping malformed import line");
                summary.skipped += 1;
                continue;
            }
        };

        match normalize(parsed) {
            Ok(event) => {
                db.insert_share_event(&event).await?;
                summary.imported += 1;
            }
            Err(e) => {
                warn!(line = index + 1, error = %e, "Skipping invalid import line");
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}
