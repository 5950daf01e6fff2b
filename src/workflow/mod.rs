//! Workflows: ordered tool calls with parameters threaded between steps.

mod engine;

pub use engine::{StepOutcome, WorkflowEngine, WorkflowResult, WorkflowStatus};

use crate::error::{MediaflowError, Result};
use crate::tool::ToolRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where a step parameter gets its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    /// A key of the workflow's initial parameters.
    Input(String),
    /// A JSON pointer into an earlier step's payload (`""` for the whole payload).
    Step { index: usize, pointer: String },
    /// A literal value.
    Value(Value),
}

impl ParamSource {
    pub fn input(key: &str) -> Self {
        ParamSource::Input(key.to_string())
    }

    pub fn step(index: usize, pointer: &str) -> Self {
        ParamSource::Step {
            index,
            pointer: pointer.to_string(),
        }
    }
}

/// One step of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub tool: String,
    /// Parameters layered over the workflow's initial parameters.
    #[serde(default)]
    pub params: BTreeMap<String, ParamSource>,
}

impl WorkflowStep {
    pub fn new(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: &str, source: ParamSource) -> Self {
        self.params.insert(name.to_string(), source);
        self
    }
}

/// A named, ordered list of steps. Read-only once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowSpec {
    /// Check that the workflow can run against `tools`.
    pub fn validate(&self, tools: &ToolRegistry) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MediaflowError::Workflow("Workflow name is empty".into()));
        }
        if self.steps.is_empty() {
            return Err(MediaflowError::Workflow(format!(
                "Workflow '{}' has no steps",
                self.name
            )));
        }

        for (position, step) in self.steps.iter().enumerate() {
            if !tools.contains(&step.tool) {
                return Err(MediaflowError::Workflow(format!(
                    "Workflow '{}' step {} uses unknown tool '{}'",
                    self.name, position, step.tool
                )));
            }
            for (param, source) in &step.params {
                if let ParamSource::Step { index, .. } = source {
                    if *index >= position {
                        return Err(MediaflowError::Workflow(format!(
                            "Workflow '{}' step {} parameter '{}' refers to step {}, which has not run yet",
                            self.name, position, param, index
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

/// Workflows shipped with the crate.
pub fn builtin_workflows() -> Vec<WorkflowSpec> {
    vec![WorkflowSpec {
        name: "clip_pipeline".to_string(),
        description: "Normalize episode audio, pick clips from its transcript, and schedule a post"
            .to_string(),
        steps: vec![
            WorkflowStep::new("audio_processing")
                .param("input_path", ParamSource::input("media_path"))
                .param("output_path", ParamSource::input("audio_output_path")),
            WorkflowStep::new("video_analysis")
                .param("transcript_path", ParamSource::input("transcript_path"))
                .param("output_path", ParamSource::input("edl_path")),
            WorkflowStep::new("content_scheduling")
                .param("media_path", ParamSource::step(0, "/output_path"))
                .param("edl_path", ParamSource::step(1, "/edl_path")),
        ],
    }]
}
