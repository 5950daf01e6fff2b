//! Reading transcripts and persisting EDLs.

use super::{Edl, TranscriptSegment};
use crate::error::{MediaflowError, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Parse segments from either a bare JSON array or an object with a `segments` array.
pub fn parse_segments(value: Value) -> Result<Vec<TranscriptSegment>> {
    let array = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("segments") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(MediaflowError::Transcript(
                    "Transcript object has no 'segments' array".to_string(),
                ))
            }
        },
        _ => {
            return Err(MediaflowError::Transcript(
                "Transcript must be an array of segments or an object with 'segments'".to_string(),
            ))
        }
    };

    array
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item)
                .map_err(|e| MediaflowError::Transcript(format!("Segment {}: {}", i, e)))
        })
        .collect()
}

/// Load transcript segments from a JSON file.
pub fn load_segments(path: &Path) -> Result<Vec<TranscriptSegment>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    let segments = parse_segments(value)?;
    info!("Loaded {} segments from {}", segments.len(), path.display());
    Ok(segments)
}

/// Write an EDL as pretty JSON, creating parent directories as needed.
pub fn write_edl(edl: &Edl, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(edl)?;
    std::fs::write(path, content)?;
    info!("Wrote EDL with {} clips to {}", edl.clips.len(), path.display());
    Ok(())
}

/// Read an EDL previously written by [`write_edl`].
pub fn read_edl(path: &Path) -> Result<Edl> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
