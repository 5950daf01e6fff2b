//! Clip selection tool.
//!
//! Reads transcript segments (inline or from a file written by the
//! transcription backend), selects clips and optionally writes the EDL.

use crate::config::ClipSettings;
use crate::edl::{parse_segments, Edl, SelectionParams};
use crate::error::ToolError;
use crate::tool::{ExecutionContext, ParamKind, ParamSpec, QualityTier, Tool, ToolRequest, ToolSchema};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{info, instrument};

/// Runs the clip selector and produces an EDL.
pub struct VideoAnalysisTool {
    defaults: ClipSettings,
}

impl VideoAnalysisTool {
    pub fn new(defaults: ClipSettings) -> Self {
        Self { defaults }
    }

    /// Selection parameters from the request, falling back to configured defaults.
    fn selection_params(&self, request: &ToolRequest) -> SelectionParams {
        let defaults = self.defaults.selection_params();
        SelectionParams {
            min_duration: request.get_f64("min_duration").unwrap_or(defaults.min_duration),
            max_duration: request.get_f64("max_duration").unwrap_or(defaults.max_duration),
            max_clips: request
                .get_u64("max_clips")
                .map(|n| n as usize)
                .unwrap_or(defaults.max_clips),
            min_score: request.get_f64("min_score").unwrap_or(defaults.min_score),
            laughter_bonus: request.get_f64("laughter_bonus").unwrap_or(defaults.laughter_bonus),
        }
    }
}

/// Clip ceiling for a tier. Lower tiers produce shorter EDLs for cheaper rendering.
fn clip_cap(tier: QualityTier, requested: usize) -> usize {
    match tier {
        QualityTier::High | QualityTier::Medium => requested,
        QualityTier::Low => requested.min(5),
        QualityTier::Minimal => requested.min(3),
    }
}

#[async_trait]
impl Tool for VideoAnalysisTool {
    fn name(&self) -> &str {
        "video_analysis"
    }

    fn description(&self) -> &str {
        "Select non-overlapping highlight clips from transcript segments and build an EDL"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(vec![
            ParamSpec::optional("segments", ParamKind::Array, "Inline transcript segments"),
            ParamSpec::optional(
                "transcript_path",
                ParamKind::String,
                "Path to a transcript JSON file",
            ),
            ParamSpec::optional("output_path", ParamKind::String, "Where to write the EDL"),
            ParamSpec::optional("min_duration", ParamKind::Number, "Minimum clip length (s)"),
            ParamSpec::optional("max_duration", ParamKind::Number, "Maximum clip length (s)"),
            ParamSpec::optional("max_clips", ParamKind::Integer, "Maximum number of clips"),
            ParamSpec::optional("min_score", ParamKind::Number, "Minimum clip score"),
            ParamSpec::optional("laughter_bonus", ParamKind::Number, "Score bonus for laughter"),
        ])
    }

    fn validate(&self, request: &ToolRequest) -> Result<(), ToolError> {
        match (request.contains("segments"), request.contains("transcript_path")) {
            (true, true) => {
                return Err(ToolError::validation(
                    "Provide either 'segments' or 'transcript_path', not both",
                ))
            }
            (false, false) => {
                return Err(ToolError::validation(
                    "One of 'segments' or 'transcript_path' is required",
                ))
            }
            _ => {}
        }

        if request.get("max_clips").is_some() && request.get_u64("max_clips").is_none() {
            return Err(ToolError::validation("'max_clips' must be a non-negative integer"));
        }

        let params = self.selection_params(request);
        if params.min_duration < 0.0 || params.min_duration > params.max_duration {
            return Err(ToolError::validation(format!(
                "Invalid duration range [{}, {}]",
                params.min_duration, params.max_duration
            )));
        }

        Ok(())
    }

    #[instrument(skip_all, fields(%tier))]
    async fn execute(
        &self,
        request: &ToolRequest,
        tier: QualityTier,
        _ctx: &ExecutionContext,
    ) -> Result<Value, ToolError> {
        let (segments, source) = match request.get_str("transcript_path") {
            Some(path) => {
                let content = tokio::fs::read_to_string(path).await?;
                let value: Value = serde_json::from_str(&content)
                    .map_err(|e| ToolError::validation(format!("Invalid transcript JSON: {}", e)))?;
                (parse_segments(value)?, Some(path.to_string()))
            }
            None => {
                let inline = request.get("segments").cloned().unwrap_or(Value::Null);
                (parse_segments(inline)?, None)
            }
        };

        let mut params = self.selection_params(request);
        params.max_clips = clip_cap(tier, params.max_clips);

        let edl = Edl::generate(&segments, &params, source);
        info!(
            segments = segments.len(),
            clips = edl.clips.len(),
            "Selected clips"
        );

        let output_path = request.get_str("output_path");
        let written = match output_path {
            Some(path) if !request.dry_run() => {
                save_edl(&edl, Path::new(path)).await?;
                true
            }
            _ => false,
        };

        Ok(json!({
            "clip_count": edl.clips.len(),
            "total_duration": edl.total_duration(),
            "edl_path": output_path,
            "written": written,
            "edl": edl,
        }))
    }
}

async fn save_edl(edl: &Edl, path: &Path) -> Result<(), ToolError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let content = serde_json::to_string_pretty(edl)
        .map_err(|e| ToolError::fatal(format!("Failed to encode EDL: {}", e)))?;
    tokio::fs::write(path, content).await?;
    info!(clips = edl.clips.len(), path = %path.display(), "Wrote EDL");
    Ok(())
}
