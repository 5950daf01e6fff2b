//! Audio transcode and loudness normalization through ffmpeg.

use crate::config::AudioSettings;
use crate::error::ToolError;
use crate::tool::{ExecutionContext, ParamKind, ParamSpec, QualityTier, Tool, ToolRequest, ToolSchema};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Encoder settings for one quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioProfile {
    pub sample_rate: u32,
    pub bitrate_kbps: u32,
    pub channels: u8,
}

impl AudioProfile {
    pub fn for_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::High => Self {
                sample_rate: 48_000,
                bitrate_kbps: 192,
                channels: 2,
            },
            QualityTier::Medium => Self {
                sample_rate: 44_100,
                bitrate_kbps: 128,
                channels: 2,
            },
            QualityTier::Low => Self {
                sample_rate: 22_050,
                bitrate_kbps: 64,
                channels: 1,
            },
            QualityTier::Minimal => Self {
                sample_rate: 16_000,
                bitrate_kbps: 32,
                channels: 1,
            },
        }
    }
}

/// Transcodes audio with a tier-dependent encoder profile.
pub struct AudioProcessingTool {
    settings: AudioSettings,
}

impl AudioProcessingTool {
    pub fn new(settings: AudioSettings) -> Self {
        Self { settings }
    }

    /// Run ffmpeg to completion. An attempt is never interrupted by cancellation;
    /// only the timeout stops it, and a stopped or failed run leaves no output behind.
    async fn run_ffmpeg(&self, args: &[String], output_path: &Path) -> Result<(), ToolError> {
        let child = Command::new(&self.settings.ffmpeg_path)
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::fatal(format!(
                    "ffmpeg not found at '{}'",
                    self.settings.ffmpeg_path
                )))
            }
            Err(e) => return Err(e.into()),
        };

        let limit = Duration::from_secs(self.settings.timeout_seconds);
        // The child is killed when the timed-out future drops, before cleanup.
        let waited = tokio::time::timeout(limit, child.wait_with_output()).await;
        let output = match waited {
            Ok(output) => output?,
            Err(_) => {
                remove_partial_output(output_path).await;
                return Err(ToolError::recoverable(format!(
                    "ffmpeg timed out after {}s",
                    self.settings.timeout_seconds
                )));
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            remove_partial_output(output_path).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(classify_ffmpeg_failure(stderr.trim()))
        }
    }
}

async fn remove_partial_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove partial output: {}", e),
    }
}

/// Build ffmpeg arguments for one transcode.
fn build_args(input: &str, output: &str, profile: AudioProfile, normalize: bool) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        input.to_string(),
        "-vn".to_string(),
    ];
    if normalize {
        args.push("-af".to_string());
        args.push("loudnorm=I=-16:TP=-1.5:LRA=11".to_string());
    }
    args.extend([
        "-ar".to_string(),
        profile.sample_rate.to_string(),
        "-ac".to_string(),
        profile.channels.to_string(),
        "-b:a".to_string(),
        format!("{}k", profile.bitrate_kbps),
        "-y".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        output.to_string(),
    ]);
    args
}

/// Map ffmpeg's stderr to a failure class.
fn classify_ffmpeg_failure(stderr: &str) -> ToolError {
    let lower = stderr.to_lowercase();
    let message = format!("ffmpeg failed: {}", stderr);

    const RESOURCE: &[&str] = &["cannot allocate memory", "out of memory", "no space left on device"];
    const TRANSIENT: &[&str] = &[
        "resource temporarily unavailable",
        "connection timed out",
        "connection reset",
        "server returned 5",
    ];
    const INPUT: &[&str] = &[
        "invalid data found",
        "no such file or directory",
        "does not contain any stream",
    ];

    if RESOURCE.iter().any(|p| lower.contains(p)) {
        ToolError::resource(message)
    } else if TRANSIENT.iter().any(|p| lower.contains(p)) {
        ToolError::recoverable(message)
    } else if INPUT.iter().any(|p| lower.contains(p)) {
        ToolError::validation(message)
    } else {
        ToolError::fatal(message)
    }
}

#[async_trait]
impl Tool for AudioProcessingTool {
    fn name(&self) -> &str {
        "audio_processing"
    }

    fn description(&self) -> &str {
        "Transcode and loudness-normalize audio with ffmpeg"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(vec![
            ParamSpec::required("input_path", ParamKind::String, "Source media file"),
            ParamSpec::required("output_path", ParamKind::String, "Destination audio file"),
            ParamSpec::optional(
                "normalize",
                ParamKind::Boolean,
                "Apply EBU R128 loudness normalization (default true)",
            ),
        ])
    }

    fn validate(&self, request: &ToolRequest) -> Result<(), ToolError> {
        if let (Some(input), Some(output)) =
            (request.get_str("input_path"), request.get_str("output_path"))
        {
            if input == output {
                return Err(ToolError::validation(
                    "'output_path' must differ from 'input_path'",
                ));
            }
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
        let input = request
            .get_str("input_path")
            .ok_or_else(|| ToolError::validation("Missing 'input_path'"))?;
        let output = request
            .get_str("output_path")
            .ok_or_else(|| ToolError::validation("Missing 'output_path'"))?;
        let normalize = request.get_bool("normalize").unwrap_or(true);

        let profile = AudioProfile::for_tier(tier);
        let args = build_args(input, output, profile, normalize);

        if request.dry_run() {
            debug!("Dry run, skipping ffmpeg");
            return Ok(json!({
                "dry_run": true,
                "output_path": output,
                "profile": profile,
                "command": std::iter::once(self.settings.ffmpeg_path.clone())
                    .chain(args)
                    .collect::<Vec<_>>(),
            }));
        }

        if !Path::new(input).exists() {
            return Err(ToolError::validation(format!("Input file not found: {}", input)));
        }
        if let Some(parent) = Path::new(output).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        self.run_ffmpeg(&args, Path::new(output)).await?;
        info!(output, sample_rate = profile.sample_rate, "Audio processed");

        Ok(json!({
            "dry_run": false,
            "output_path": output,
            "profile": profile,
        }))
    }
}
