//! Tools command implementation.

use crate::cli::Output;
use crate::manager::ToolsetManager;
use anyhow::Result;

/// List tools and workflows.
pub fn run_tools(manager: &ToolsetManager, json: bool) -> Result<()> {
    if json {
        let tools = manager.describe_tools();
        println!("{}", serde_json::to_string_pretty(&tools)?);
        return Ok(());
    }

    Output::header("Tools");
    for tool in manager.describe_tools() {
        let name = tool["name"].as_str().unwrap_or_default();
        let description = tool["description"].as_str().unwrap_or_default();
        Output::list_item(&format!("{} - {}", name, description));
    }

    Output::header("Workflows");
    for name in manager.workflow_names() {
        let Some(spec) = manager.workflow(&name) else {
            continue;
        };
        let steps: Vec<&str> = spec.steps.iter().map(|s| s.tool.as_str()).collect();
        Output::list_item(&format!("{} - {}", name, steps.join(" -> ")));
        if !spec.description.is_empty() {
            Output::kv("description", &spec.description);
        }
    }

    Ok(())
}
