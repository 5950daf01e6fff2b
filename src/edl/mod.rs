//! Edit Decision List generation.
//!
//! Turns transcript segments from the transcription backend into a ranked,
//! non-overlapping list of clip candidates for the clip renderer.

mod io;
mod selector;

pub use io::{load_segments, parse_segments, read_edl, write_edl};
pub use selector::select;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A transcript segment as produced by the transcription backend.
///
/// Accepts either `start`/`end` or `start_time`/`end_time` for its time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    #[serde(alias = "start_time", alias = "start_seconds")]
    pub start: f64,
    #[serde(alias = "end_time", alias = "end_seconds")]
    pub end: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funny_score: Option<f64>,
    #[serde(default, alias = "has_laughter", deserialize_with = "null_as_false")]
    pub laughter: bool,
}

/// Treat an explicit `null` flag like a missing one.
fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            funny_score: None,
            laughter: false,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.funny_score = Some(score);
        self
    }

    pub fn with_laughter(mut self) -> Self {
        self.laughter = true;
        self
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Ranking score: the funny score (0 when absent) plus the laughter bonus.
    pub fn score(&self, laughter_bonus: f64) -> f64 {
        let base = self.funny_score.filter(|s| s.is_finite()).unwrap_or(0.0);
        if self.laughter {
            base + laughter_bonus
        } else {
            base
        }
    }
}

/// Parameters controlling clip selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionParams {
    pub min_duration: f64,
    pub max_duration: f64,
    pub max_clips: usize,
    pub min_score: f64,
    pub laughter_bonus: f64,
}

impl Default for SelectionParams {
    fn default() -> Self {
        Self {
            min_duration: 5.0,
            max_duration: 60.0,
            max_clips: 10,
            min_score: 0.0,
            laughter_bonus: 2.0,
        }
    }
}

/// A selected clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipCandidate {
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub score: f64,
    /// Indices of the source segments in the input transcript.
    pub segment_indices: Vec<usize>,
    pub text: String,
}

impl ClipCandidate {
    /// Half-open overlap test: touching clips do not overlap.
    pub fn overlaps(&self, other: &ClipCandidate) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Generation metadata stored alongside the clips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdlMetadata {
    pub params: SelectionParams,
    pub total_clips: usize,
    pub segments_considered: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub generated_at: DateTime<Utc>,
}

/// An Edit Decision List: clips in selection order plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edl {
    pub clips: Vec<ClipCandidate>,
    pub metadata: EdlMetadata,
}

impl Edl {
    /// Run the selector over `segments` and wrap the result.
    pub fn generate(
        segments: &[TranscriptSegment],
        params: &SelectionParams,
        source: Option<String>,
    ) -> Self {
        let clips = select(segments, params);
        Self {
            metadata: EdlMetadata {
                params: params.clone(),
                total_clips: clips.len(),
                segments_considered: segments.len(),
                source,
                generated_at: Utc::now(),
            },
            clips,
        }
    }

    /// Clips re-sorted by start time, for assembling in transcript order.
    pub fn in_timeline_order(&self) -> Vec<ClipCandidate> {
        let mut clips = self.clips.clone();
        clips.sort_by(|a, b| a.start.total_cmp(&b.start));
        clips
    }

    /// Sum of clip durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_key_conventions() {
        let a: TranscriptSegment =
            serde_json::from_str(r#"{"start": 1.0, "end": 2.5, "text": "hi"}"#).unwrap();
        let b: TranscriptSegment = serde_json::from_str(
            r#"{"start_time": 1.0, "end_time": 2.5, "text": "hi", "funny_score": 4, "laughter": true}"#,
        )
        .unwrap();

        assert_eq!(a.start, b.start);
        assert_eq!(a.end, b.end);
        assert_eq!(a.score(2.0), 0.0);
        assert_eq!(b.score(2.0), 6.0);
    }

    #[test]
    fn test_generate_and_timeline_order() {
        let segments = vec![
            TranscriptSegment::new(30.0, 40.0, "late").with_score(9.0),
            TranscriptSegment::new(0.0, 10.0, "early").with_score(3.0),
        ];
        let edl = Edl::generate(&segments, &SelectionParams::default(), Some("ep1.json".into()));

        assert_eq!(edl.metadata.total_clips, 2);
        assert_eq!(edl.metadata.segments_considered, 2);
        assert_eq!(edl.clips[0].text, "late");
        assert_eq!(edl.in_timeline_order()[0].text, "early");
        assert_eq!(edl.total_duration(), 20.0);
    }
}
