//! The toolset facade.
//!
//! [`ToolsetManager`] owns the tool registry, the workflow catalogue, the
//! supervisor and the metrics. It is shared behind an `Arc` and every method
//! takes `&self`, so tools can run concurrently.

use crate::config::{HealthSettings, Settings};
use crate::error::{MediaflowError, Result, ToolError};
use crate::health::{self, HealthReport};
use crate::metrics::{MetricsRegistry, ToolMetrics};
use crate::monitor::{ResourceMonitor, SystemResourceMonitor};
use crate::supervisor::{Supervisor, ToolResult};
use crate::tool::{ExecutionContext, Tool, ToolRegistry, ToolRequest};
use crate::tools::builtin_tools;
use crate::workflow::{builtin_workflows, WorkflowEngine, WorkflowResult, WorkflowSpec};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tracing::{info, warn};

pub struct ToolsetManager {
    tools: RwLock<ToolRegistry>,
    workflows: RwLock<HashMap<String, Arc<WorkflowSpec>>>,
    supervisor: Arc<Supervisor>,
    engine: WorkflowEngine,
    metrics: Arc<MetricsRegistry>,
    monitor: Arc<dyn ResourceMonitor>,
    health: HealthSettings,
}

impl ToolsetManager {
    /// Create an empty manager. Register tools and workflows before use.
    pub fn new(settings: &Settings, monitor: Arc<dyn ResourceMonitor>) -> Self {
        let metrics = Arc::new(MetricsRegistry::new(settings.metrics.error_history));
        let supervisor = Arc::new(Supervisor::new(
            metrics.clone(),
            monitor.clone(),
            settings.retry.clone(),
            settings.general.default_quality,
        ));

        Self {
            tools: RwLock::new(ToolRegistry::new()),
            workflows: RwLock::new(HashMap::new()),
            engine: WorkflowEngine::new(supervisor.clone()),
            supervisor,
            metrics,
            monitor,
            health: settings.health.clone(),
        }
    }

    /// Create a manager with the bundled tools, the built-in workflows and any
    /// workflows from `settings`, sampling the host through `sysinfo`.
    pub fn with_defaults(settings: &Settings) -> Result<Self> {
        Self::with_monitor(settings, Arc::new(SystemResourceMonitor::new()))
    }

    /// Like [`ToolsetManager::with_defaults`] with a caller-supplied monitor.
    pub fn with_monitor(settings: &Settings, monitor: Arc<dyn ResourceMonitor>) -> Result<Self> {
        let manager = Self::new(settings, monitor);
        for tool in builtin_tools(settings) {
            manager.register_tool(tool);
        }
        for spec in builtin_workflows().into_iter().chain(settings.workflows.iter().cloned()) {
            manager.register_workflow(spec)?;
        }
        Ok(manager)
    }

    fn tools(&self) -> RwLockReadGuard<'_, ToolRegistry> {
        match self.tools.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn tools_mut(&self) -> RwLockWriteGuard<'_, ToolRegistry> {
        match self.tools.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn workflows(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<WorkflowSpec>>> {
        match self.workflows.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a tool, replacing one with the same name.
    pub fn register_tool(&self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.metrics.register(&name);
        if self.tools_mut().register(tool).is_some() {
            warn!(tool = %name, "Replaced existing tool");
        } else {
            info!(tool = %name, "Registered tool");
        }
    }

    /// Register a workflow after checking it against the current tools.
    pub fn register_workflow(&self, spec: WorkflowSpec) -> Result<()> {
        spec.validate(&self.tools())?;

        let mut workflows = match self.workflows.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if workflows.contains_key(&spec.name) {
            return Err(MediaflowError::Workflow(format!(
                "Workflow '{}' is already registered",
                spec.name
            )));
        }
        info!(workflow = %spec.name, steps = spec.steps.len(), "Registered workflow");
        workflows.insert(spec.name.clone(), Arc::new(spec));
        Ok(())
    }

    /// Run one tool under the supervisor.
    pub async fn execute_tool(&self, name: &str, request: &ToolRequest) -> ToolResult {
        self.execute_tool_with(name, request, &ExecutionContext::new()).await
    }

    /// Run one tool under the supervisor with a caller-owned context.
    pub async fn execute_tool_with(
        &self,
        name: &str,
        request: &ToolRequest,
        ctx: &ExecutionContext,
    ) -> ToolResult {
        let tool = self.tools().get(name);
        match tool {
            Some(tool) => self.supervisor.execute(tool.as_ref(), request, ctx).await,
            None => ToolResult::failure(
                name,
                ToolError::validation(format!("Unknown tool '{}'", name)),
                None,
                0,
                0,
                Duration::ZERO,
            ),
        }
    }

    /// Run a registered workflow.
    pub async fn execute_workflow(&self, name: &str, params: &ToolRequest) -> WorkflowResult {
        self.execute_workflow_with(name, params, &ExecutionContext::new())
            .await
    }

    /// Run a registered workflow with a caller-owned context.
    pub async fn execute_workflow_with(
        &self,
        name: &str,
        params: &ToolRequest,
        ctx: &ExecutionContext,
    ) -> WorkflowResult {
        let spec = self.workflows().get(name).cloned();
        let Some(spec) = spec else {
            return WorkflowResult::rejected(
                name,
                ToolError::validation(format!("Unknown workflow '{}'", name)),
                params.dry_run(),
            );
        };
        let tools = self.tools().clone();
        self.engine.run(&spec, &tools, params, ctx).await
    }

    /// Snapshot of every tool's metrics.
    pub fn get_metrics(&self) -> BTreeMap<String, ToolMetrics> {
        self.metrics.snapshot()
    }

    pub fn get_tool_metrics(&self, name: &str) -> Option<ToolMetrics> {
        self.metrics.get(name)
    }

    /// Classify health from a fresh resource reading and tool failure rates.
    pub fn get_health_status(&self) -> HealthReport {
        health::evaluate(self.monitor.sample(), &self.metrics.snapshot(), &self.health)
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
        info!("Metrics reset");
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools().names()
    }

    pub fn workflow_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.workflows().keys().cloned().collect();
        names.sort();
        names
    }

    /// Name, description and parameter schema of every tool.
    pub fn describe_tools(&self) -> Vec<Value> {
        self.tools().describe()
    }

    pub fn workflow(&self, name: &str) -> Option<Arc<WorkflowSpec>> {
        self.workflows().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::health::HealthStatus;
    use crate::monitor::StaticResourceMonitor;
    use crate::supervisor::RetryPolicy;
    use crate::tool::testing::ScriptedTool;
    use crate::workflow::WorkflowStep;
    use serde_json::json;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.retry.default = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        settings
    }

    fn manager() -> (ToolsetManager, Arc<StaticResourceMonitor>) {
        let monitor = Arc::new(StaticResourceMonitor::idle());
        (ToolsetManager::new(&settings(), monitor.clone()), monitor)
    }

    #[tokio::test]
    async fn test_unknown_tool_is_validation_failure() {
        let (manager, _) = manager();
        let result = manager.execute_tool("nope", &ToolRequest::new()).await;

        assert!(!result.is_success());
        assert_eq!(result.error.unwrap().kind, ErrorKind::Validation);
        assert_eq!(result.attempts, 0);
        assert!(manager.get_metrics().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_validation_failure() {
        let (manager, _) = manager();
        let result = manager.execute_workflow("nope", &ToolRequest::new()).await;

        assert!(!result.is_success());
        assert_eq!(result.error().unwrap().kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_health_critical_from_failure_rate() {
        let (manager, monitor) = manager();
        manager.register_tool(Arc::new(ScriptedTool::new("flaky", |_, call| {
            if call % 2 == 0 {
                Err(ToolError::fatal("boom"))
            } else {
                Ok(json!({}))
            }
        })));

        for _ in 0..4 {
            manager.execute_tool("flaky", &ToolRequest::new()).await;
        }

        let report = manager.get_health_status();
        assert_eq!(report.status, HealthStatus::Critical);
        assert_eq!(report.tool_failure_rates["flaky"], 0.5);

        manager.reset_metrics();
        monitor.set(85.0, 10.0, 10.0);
        let report = manager.get_health_status();
        assert_eq!(report.status, HealthStatus::Warning);
        assert_eq!(report.tool_failure_rates["flaky"], 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_executions_are_all_counted() {
        let (manager, _) = manager();
        manager.register_tool(Arc::new(ScriptedTool::new("render", |_, _| Ok(json!({})))));
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager.execute_tool("render", &ToolRequest::new()).await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap().is_success());
        }

        let metrics = manager.get_tool_metrics("render").unwrap();
        assert_eq!(metrics.execution_count, 16);
        assert_eq!(metrics.success_count, 16);
    }

    #[test]
    fn test_register_workflow_checks_tools_and_duplicates() {
        let (manager, _) = manager();
        let spec = WorkflowSpec {
            name: "one".into(),
            description: String::new(),
            steps: vec![WorkflowStep::new("render")],
        };
        assert!(manager.register_workflow(spec.clone()).is_err());

        manager.register_tool(Arc::new(ScriptedTool::new("render", |_, _| Ok(json!({})))));
        manager.register_workflow(spec.clone()).unwrap();
        assert!(manager.register_workflow(spec).is_err());
        assert_eq!(manager.workflow_names(), vec!["one".to_string()]);
    }

    #[tokio::test]
    async fn test_defaults_register_bundled_tools() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings();
        settings.scheduling.outbox_path = dir.path().join("outbox.jsonl").display().to_string();

        let manager =
            ToolsetManager::with_monitor(&settings, Arc::new(StaticResourceMonitor::idle())).unwrap();
        assert_eq!(
            manager.tool_names(),
            vec!["audio_processing", "content_scheduling", "video_analysis"]
        );
        assert!(manager.workflow_names().contains(&"clip_pipeline".to_string()));

        let params = ToolRequest::new()
            .with_param("dry_run", true)
            .with_param("media_path", "/episodes/12.mp4")
            .with_param("audio_output_path", "/episodes/12.mp3")
            .with_param(
                "segments",
                json!([{"start": 0, "end": 20, "text": "bit", "funny_score": 8}]),
            )
            .with_param("edl_path", "/episodes/12.edl.json")
            .with_param("platform", "youtube")
            .with_param("caption", "Episode 12 highlights");

        let mut spec = WorkflowSpec::clone(&manager.workflow("clip_pipeline").unwrap());
        spec.name = "inline_pipeline".into();
        spec.steps[1].params.remove("transcript_path");
        manager.register_workflow(spec).unwrap();

        let result = manager.execute_workflow("inline_pipeline", &params).await;
        assert!(result.is_success(), "{:?}", result.error());
        assert_eq!(result.steps.len(), 3);
        let post = &result.output().unwrap()["post"];
        assert_eq!(post["media_path"], "/episodes/12.mp3");
        assert_eq!(post["edl_path"], "/episodes/12.edl.json");
        assert!(!dir.path().join("outbox.jsonl").exists());
    }
}
