//! Health command implementation.

use crate::cli::Output;
use crate::manager::ToolsetManager;
use anyhow::Result;

/// Print the current health classification.
pub fn run_health(manager: &ToolsetManager) -> Result<()> {
    let report = manager.get_health_status();
    Output::health(&report);
    Ok(())
}
