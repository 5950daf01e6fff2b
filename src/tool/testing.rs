//! Scripted tool for exercising the engine in tests.

use super::{ExecutionContext, ParamKind, ParamSpec, QualityTier, Tool, ToolRequest, ToolSchema};
use crate::error::ToolError;
use crate::supervisor::RetryPolicy;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

type Script = dyn Fn(QualityTier, usize) -> Result<Value, ToolError> + Send + Sync;

/// A tool whose behaviour is a closure of (tier, call number).
pub struct ScriptedTool {
    name: String,
    script: Box<Script>,
    required: Vec<String>,
    policy: Option<RetryPolicy>,
    calls: Mutex<Vec<QualityTier>>,
    requests: Mutex<Vec<ToolRequest>>,
}

impl ScriptedTool {
    pub fn new<F>(name: &str, script: F) -> Self
    where
        F: Fn(QualityTier, usize) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            script: Box::new(script),
            required: Vec::new(),
            policy: None,
            calls: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requiring(mut self, param: &str) -> Self {
        self.required.push(param.to_string());
        self
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Tiers of every attempt so far.
    pub fn calls(&self) -> Vec<QualityTier> {
        self.calls.lock().unwrap().clone()
    }

    /// Requests of every attempt so far.
    pub fn requests(&self) -> Vec<ToolRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for ScriptedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Scripted test tool"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            self.required
                .iter()
                .map(|p| ParamSpec::required(p, ParamKind::Any, "test parameter"))
                .collect(),
        )
    }

    fn retry_policy(&self) -> Option<RetryPolicy> {
        self.policy.clone()
    }

    async fn execute(
        &self,
        request: &ToolRequest,
        tier: QualityTier,
        _ctx: &ExecutionContext,
    ) -> Result<Value, ToolError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(tier);
            calls.len() - 1
        };
        self.requests.lock().unwrap().push(request.clone());
        (self.script)(tier, call)
    }
}
