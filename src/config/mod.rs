//! Configuration module for mediaflow.
//!
//! Handles loading and saving application settings.

mod settings;

pub use settings::{
    AudioSettings, ClipSettings, GeneralSettings, HealthSettings, MetricsSettings,
    RetrySettings, SchedulingSettings, Settings,
};
