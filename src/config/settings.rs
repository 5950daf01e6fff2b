//! Configuration settings for mediaflow.

use crate::edl::SelectionParams;
use crate::supervisor::RetryPolicy;
use crate::tool::QualityTier;
use crate::workflow::WorkflowSpec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub retry: RetrySettings,
    pub metrics: MetricsSettings,
    pub health: HealthSettings,
    pub clips: ClipSettings,
    pub audio: AudioSettings,
    pub scheduling: SchedulingSettings,
    /// Additional workflows registered alongside the built-in ones.
    pub workflows: Vec<WorkflowSpec>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Tier used when a request carries no `quality` parameter.
    pub default_quality: QualityTier,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.mediaflow".to_string(),
            log_level: "info".to_string(),
            default_quality: QualityTier::High,
        }
    }
}

/// Retry policy settings.
///
/// `default` applies to every tool that neither declares its own policy nor
/// has an entry in `overrides`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RetrySettings {
    pub default: RetryPolicy,
    /// Per-tool policies, keyed by tool name.
    pub overrides: HashMap<String, RetryPolicy>,
}

impl RetrySettings {
    /// Resolve the policy for a tool: config override, then the tool's own, then the default.
    pub fn policy_for(&self, tool_name: &str, declared: Option<RetryPolicy>) -> RetryPolicy {
        self.overrides
            .get(tool_name)
            .cloned()
            .or(declared)
            .unwrap_or_else(|| self.default.clone())
    }
}

/// Metrics collection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    /// Number of recent error records kept per tool.
    pub error_history: usize,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { error_history: 20 }
    }
}

/// Thresholds for the health classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Tool failure rate (0.0-1.0) above which status is at least warning.
    pub failure_rate_warning: f64,
    /// Tool failure rate (0.0-1.0) above which status is critical.
    pub failure_rate_critical: f64,
    /// CPU/memory/disk usage percentage at which status is at least warning.
    pub resource_warning_percent: f32,
    /// CPU/memory/disk usage percentage at which status is critical.
    pub resource_critical_percent: f32,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            failure_rate_warning: 0.1,
            failure_rate_critical: 0.25,
            resource_warning_percent: 80.0,
            resource_critical_percent: 95.0,
        }
    }
}

/// Default clip selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSettings {
    /// Minimum clip duration in seconds.
    pub min_duration: f64,
    /// Maximum clip duration in seconds.
    pub max_duration: f64,
    /// Maximum number of clips in one EDL.
    pub max_clips: usize,
    /// Minimum score a segment needs to become a clip.
    pub min_score: f64,
    /// Score added to segments flagged with laughter.
    pub laughter_bonus: f64,
}

impl Default for ClipSettings {
    fn default() -> Self {
        let params = SelectionParams::default();
        Self {
            min_duration: params.min_duration,
            max_duration: params.max_duration,
            max_clips: params.max_clips,
            min_score: params.min_score,
            laughter_bonus: params.laughter_bonus,
        }
    }
}

impl ClipSettings {
    /// Selection parameters built from these defaults.
    pub fn selection_params(&self) -> SelectionParams {
        SelectionParams {
            min_duration: self.min_duration,
            max_duration: self.max_duration,
            max_clips: self.max_clips,
            min_score: self.min_score,
            laughter_bonus: self.laughter_bonus,
        }
    }
}

/// Audio processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// ffmpeg executable name or path.
    pub ffmpeg_path: String,
    /// Timeout for a single ffmpeg run, in seconds.
    pub timeout_seconds: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            timeout_seconds: 600,
        }
    }
}

/// Content scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingSettings {
    /// JSON-lines file where scheduled posts are queued for the poster.
    pub outbox_path: String,
    /// Platforms accepted by the scheduling tool.
    pub platforms: Vec<String>,
    /// Maximum caption length in characters.
    pub max_caption_chars: usize,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            outbox_path: "~/.mediaflow/outbox.jsonl".to_string(),
            platforms: vec![
                "youtube".to_string(),
                "tiktok".to_string(),
                "instagram".to_string(),
                "twitter".to_string(),
            ],
            max_caption_chars: 2200,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::MediaflowError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings that would make the engine misbehave.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::MediaflowError;

        let health = &self.health;
        if health.failure_rate_warning > health.failure_rate_critical {
            return Err(MediaflowError::Config(
                "health.failure_rate_warning must not exceed health.failure_rate_critical".into(),
            ));
        }
        if health.resource_warning_percent > health.resource_critical_percent {
            return Err(MediaflowError::Config(
                "health.resource_warning_percent must not exceed health.resource_critical_percent"
                    .into(),
            ));
        }

        for (name, policy) in std::iter::once(("default", &self.retry.default))
            .chain(self.retry.overrides.iter().map(|(k, v)| (k.as_str(), v)))
        {
            if policy.max_attempts == 0 {
                return Err(MediaflowError::Config(format!(
                    "retry policy '{}' must allow at least one attempt",
                    name
                )));
            }
        }

        if self.clips.min_duration > self.clips.max_duration {
            return Err(MediaflowError::Config(
                "clips.min_duration must not exceed clips.max_duration".into(),
            ));
        }

        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mediaflow")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded outbox path.
    pub fn outbox_path(&self) -> PathBuf {
        Self::expand_path(&self.scheduling.outbox_path)
    }
}
