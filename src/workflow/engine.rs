//! Sequential workflow execution.

use super::{ParamSource, WorkflowSpec, WorkflowStep};
use crate::error::ToolError;
use crate::supervisor::{Supervisor, ToolResult};
use crate::tool::{ExecutionContext, ToolRegistry, ToolRequest};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Overall outcome of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Completed,
    Failed,
}

/// Result of one executed (or attempted) step.
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub tool: String,
    pub result: ToolResult,
}

/// Everything a caller needs to see what happened in a run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub workflow: String,
    pub status: WorkflowStatus,
    /// Completed steps, followed by the failing step if any.
    pub steps: Vec<StepOutcome>,
    pub failed_step: Option<usize>,
    /// Set when the run was refused before any step started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<ToolError>,
    pub dry_run: bool,
    #[serde(rename = "execution_time_ms", serialize_with = "as_millis")]
    pub execution_time: Duration,
}

impl WorkflowResult {
    /// A run refused up front, e.g. for an unknown workflow name.
    pub fn rejected(workflow: &str, error: ToolError, dry_run: bool) -> Self {
        Self {
            workflow: workflow.to_string(),
            status: WorkflowStatus::Failed,
            steps: Vec::new(),
            failed_step: None,
            rejected: Some(error),
            dry_run,
            execution_time: Duration::ZERO,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }

    /// Payload of the last successful step.
    pub fn output(&self) -> Option<&Value> {
        self.steps
            .iter()
            .rev()
            .find(|s| s.result.is_success())
            .and_then(|s| s.result.payload.as_ref())
    }

    /// Why the run failed: the rejection, or the failing step's error.
    pub fn error(&self) -> Option<&ToolError> {
        if let Some(err) = &self.rejected {
            return Some(err);
        }
        let index = self.failed_step?;
        self.steps
            .iter()
            .find(|s| s.index == index)
            .and_then(|s| s.result.error.as_ref())
    }
}

/// Runs workflow steps in order through the supervisor.
pub struct WorkflowEngine {
    supervisor: Arc<Supervisor>,
}

impl WorkflowEngine {
    pub fn new(supervisor: Arc<Supervisor>) -> Self {
        Self { supervisor }
    }

    /// Run `spec` with `params` as the initial parameter set.
    ///
    /// Stops at the first failing step; completed steps are never re-run.
    #[instrument(skip_all, fields(workflow = %spec.name))]
    pub async fn run(
        &self,
        spec: &WorkflowSpec,
        tools: &ToolRegistry,
        params: &ToolRequest,
        ctx: &ExecutionContext,
    ) -> WorkflowResult {
        let started = Instant::now();
        let dry_run = params.dry_run();
        let mut steps: Vec<StepOutcome> = Vec::with_capacity(spec.steps.len());
        let mut failed_step = None;

        info!(steps = spec.steps.len(), dry_run, "Starting workflow");

        for (index, step) in spec.steps.iter().enumerate() {
            let result = if ctx.is_cancelled() {
                ToolResult::failure(
                    &step.tool,
                    ToolError::cancelled("Workflow cancelled before step"),
                    None,
                    0,
                    0,
                    Duration::ZERO,
                )
            } else {
                match (tools.get(&step.tool), resolve_request(step, params, &steps)) {
                    (None, _) => ToolResult::failure(
                        &step.tool,
                        ToolError::validation(format!("Unknown tool '{}'", step.tool)),
                        None,
                        0,
                        0,
                        Duration::ZERO,
                    ),
                    (_, Err(err)) => {
                        ToolResult::failure(&step.tool, err, None, 0, 0, Duration::ZERO)
                    }
                    (Some(tool), Ok(request)) => {
                        self.supervisor.execute(tool.as_ref(), &request, ctx).await
                    }
                }
            };

            let success = result.is_success();
            steps.push(StepOutcome {
                index,
                tool: step.tool.clone(),
                result,
            });

            if !success {
                warn!(step = index, tool = %step.tool, "Workflow halted at failing step");
                failed_step = Some(index);
                break;
            }
        }

        let status = if failed_step.is_some() {
            WorkflowStatus::Failed
        } else {
            WorkflowStatus::Completed
        };
        info!(?status, elapsed_ms = started.elapsed().as_millis() as u64, "Workflow finished");

        WorkflowResult {
            workflow: spec.name.clone(),
            status,
            steps,
            failed_step,
            rejected: None,
            dry_run,
            execution_time: started.elapsed(),
        }
    }
}

/// Build a step's request: initial parameters overlaid with its resolved mapping.
fn resolve_request(
    step: &WorkflowStep,
    initial: &ToolRequest,
    completed: &[StepOutcome],
) -> Result<ToolRequest, ToolError> {
    let mut params = initial.params().clone();

    for (name, source) in &step.params {
        let value = match source {
            ParamSource::Input(key) => initial.get(key).cloned().ok_or_else(|| {
                ToolError::validation(format!(
                    "Parameter '{}' maps to missing workflow input '{}'",
                    name, key
                ))
            })?,
            ParamSource::Step { index, pointer } => {
                let payload = completed
                    .iter()
                    .find(|s| s.index == *index)
                    .and_then(|s| s.result.payload.as_ref())
                    .ok_or_else(|| {
                        ToolError::validation(format!(
                            "Parameter '{}' maps to step {}, which has no result",
                            name, index
                        ))
                    })?;
                payload.pointer(pointer).cloned().ok_or_else(|| {
                    ToolError::validation(format!(
                        "Parameter '{}': step {} payload has nothing at '{}'",
                        name, index, pointer
                    ))
                })?
            }
            ParamSource::Value(value) => value.clone(),
        };
        params.insert(name.clone(), value);
    }

    // A dry run stays dry for every step, whatever the mapping says.
    if initial.dry_run() {
        params.insert("dry_run".to_string(), Value::Bool(true));
    }

    Ok(ToolRequest::from_params(params))
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}
