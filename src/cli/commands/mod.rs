//! CLI command implementations.

mod clips;
mod config;
mod health;
mod run;
mod tools;

pub use clips::run_clips;
pub use config::run_config;
pub use health::run_health;
pub use run::{run_tool, run_workflow};
pub use tools::run_tools;
