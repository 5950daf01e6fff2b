//! Clips command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::edl::{load_segments, write_edl, Edl};
use anyhow::{bail, Result};
use std::path::Path;

/// Select clips from a transcript file without going through the supervisor.
pub fn run_clips(
    transcript: &str,
    output: Option<&str>,
    min_duration: Option<f64>,
    max_duration: Option<f64>,
    max_clips: Option<usize>,
    min_score: Option<f64>,
    settings: &Settings,
) -> Result<()> {
    let mut params = settings.clips.selection_params();
    params.min_duration = min_duration.unwrap_or(params.min_duration);
    params.max_duration = max_duration.unwrap_or(params.max_duration);
    params.max_clips = max_clips.unwrap_or(params.max_clips);
    params.min_score = min_score.unwrap_or(params.min_score);

    if params.min_duration > params.max_duration {
        bail!(
            "--min-duration ({}) exceeds --max-duration ({})",
            params.min_duration,
            params.max_duration
        );
    }

    let path = Settings::expand_path(transcript);
    let segments = load_segments(&path)?;
    let edl = Edl::generate(&segments, &params, Some(path.display().to_string()));

    Output::edl(&edl);

    if let Some(out) = output {
        let out = Settings::expand_path(out);
        write_edl(&edl, Path::new(&out))?;
        Output::success(&format!("EDL written to {}", out.display()));
    }

    Ok(())
}
