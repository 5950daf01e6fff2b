//! Run and workflow command implementations.

use crate::cli::{parse_params, Output};
use crate::manager::ToolsetManager;
use crate::tool::{ExecutionContext, QualityTier, ToolRequest};
use anyhow::{anyhow, bail, Result};
use tracing::debug;

fn build_request(params: &[String], dry_run: bool, quality: Option<&str>) -> Result<ToolRequest> {
    let mut request = parse_params(params)?;
    if dry_run {
        request = request.with_param("dry_run", true);
    }
    if let Some(quality) = quality {
        let tier: QualityTier = quality.parse().map_err(|e: String| anyhow!(e))?;
        request = request.with_param("quality", tier.as_str());
    }
    Ok(request)
}

/// Context cancelled on Ctrl-C, so backoff waits end early.
fn interruptible_context() -> ExecutionContext {
    let ctx = ExecutionContext::new();
    let token = ctx.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    ctx
}

/// Run a single tool and print its result.
pub async fn run_tool(
    manager: &ToolsetManager,
    tool: &str,
    params: &[String],
    dry_run: bool,
    quality: Option<&str>,
) -> Result<()> {
    let request = build_request(params, dry_run, quality)?;
    debug!(?request, "Running tool");

    let spinner = Output::spinner(&format!("Running {}...", tool));
    let result = manager
        .execute_tool_with(tool, &request, &interruptible_context())
        .await;
    spinner.finish_and_clear();

    Output::tool_result(&result);
    if let Some(payload) = &result.payload {
        println!("{}", serde_json::to_string_pretty(payload)?);
    }

    match result.error {
        None => Ok(()),
        Some(err) => bail!("Tool '{}' failed: {}", tool, err),
    }
}

/// Run a workflow and print every step.
pub async fn run_workflow(
    manager: &ToolsetManager,
    name: &str,
    params: &[String],
    dry_run: bool,
    quality: Option<&str>,
) -> Result<()> {
    let request = build_request(params, dry_run, quality)?;

    let spinner = Output::spinner(&format!("Running workflow {}...", name));
    let result = manager
        .execute_workflow_with(name, &request, &interruptible_context())
        .await;
    spinner.finish_and_clear();

    Output::workflow_result(&result);
    if let Some(output) = result.output() {
        println!("{}", serde_json::to_string_pretty(output)?);
    }

    match result.error() {
        None => Ok(()),
        Some(err) => bail!("Workflow '{}' failed: {}", name, err),
    }
}
