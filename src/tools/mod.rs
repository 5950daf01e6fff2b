//! Bundled tools.
//!
//! - `video_analysis` - clip selection over a transcript, producing an EDL
//! - `audio_processing` - tier-dependent ffmpeg transcode and loudness normalization
//! - `content_scheduling` - queue a post for a social platform through a [`Publisher`]

mod audio_processing;
mod content_scheduling;
mod video_analysis;

pub use audio_processing::{AudioProcessingTool, AudioProfile};
pub use content_scheduling::{ContentSchedulingTool, OutboxPublisher, Publisher, ScheduledPost};
pub use video_analysis::VideoAnalysisTool;

use crate::config::Settings;
use crate::tool::Tool;
use std::sync::Arc;

/// Instantiate every bundled tool from settings.
pub fn builtin_tools(settings: &Settings) -> Vec<Arc<dyn Tool>> {
    let publisher = Arc::new(OutboxPublisher::new(settings.outbox_path()));
    vec![
        Arc::new(VideoAnalysisTool::new(settings.clips.clone())),
        Arc::new(AudioProcessingTool::new(settings.audio.clone())),
        Arc::new(ContentSchedulingTool::new(settings.scheduling.clone(), publisher)),
    ]
}
