//! mediaflow - supervised media tools
//!
//! A toolset for short-form media production: pick highlight clips from a
//! transcript, transcode audio, and schedule posts. Every tool call runs under
//! a supervisor that retries transient failures, steps quality down when the
//! host runs out of resources, and records per-tool metrics for health checks.
//!
//! # Architecture
//!
//! - `config` - TOML settings
//! - `error` - library errors and the tool failure taxonomy
//! - `tool` - the `Tool` trait, requests, schemas and the registry
//! - `supervisor` - retry, backoff and quality degradation around one call
//! - `metrics` - per-tool execution counters and recent errors
//! - `monitor` - CPU, memory and disk readings
//! - `health` - tri-state health classification
//! - `workflow` - ordered multi-tool runs with parameter threading
//! - `edl` - clip selection and Edit Decision Lists
//! - `tools` - bundled tools
//! - `manager` - the facade tying it all together
//!
//! # Example
//!
//! ```rust,no_run
//! use mediaflow::config::Settings;
//! use mediaflow::manager::ToolsetManager;
//! use mediaflow::tool::ToolRequest;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let manager = ToolsetManager::with_defaults(&settings)?;
//!
//!     let request = ToolRequest::new()
//!         .with_param("transcript_path", "episode-12.json")
//!         .with_param("output_path", "episode-12.edl.json")
//!         .with_param("max_clips", json!(5));
//!     let result = manager.execute_tool("video_analysis", &request).await;
//!     println!("{:?} after {} attempts", result.status, result.attempts);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod edl;
pub mod error;
pub mod health;
pub mod manager;
pub mod metrics;
pub mod monitor;
pub mod supervisor;
pub mod tool;
pub mod tools;
pub mod workflow;

pub use error::{MediaflowError, Result};
