//! Execution supervisor.
//!
//! Wraps a single tool call with validation, retry with exponential backoff,
//! quality tier degradation and metrics capture. Every path ends in a
//! [`ToolResult`]; nothing is propagated to the caller as an error.

mod result;
mod retry;

pub use result::{ToolResult, ToolStatus};
pub use retry::RetryPolicy;

use crate::config::RetrySettings;
use crate::error::{ErrorKind, ToolError};
use crate::metrics::MetricsRegistry;
use crate::monitor::ResourceMonitor;
use crate::tool::{ExecutionContext, QualityTier, Tool, ToolRequest};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Runs tools under the retry and degradation rules.
pub struct Supervisor {
    metrics: Arc<MetricsRegistry>,
    monitor: Arc<dyn ResourceMonitor>,
    retry: RetrySettings,
    default_quality: QualityTier,
}

impl Supervisor {
    pub fn new(
        metrics: Arc<MetricsRegistry>,
        monitor: Arc<dyn ResourceMonitor>,
        retry: RetrySettings,
        default_quality: QualityTier,
    ) -> Self {
        Self {
            metrics,
            monitor,
            retry,
            default_quality,
        }
    }

    /// Execute `tool` with `request`, recording the outcome in the metrics registry.
    #[instrument(skip_all, fields(tool = %tool.name()))]
    pub async fn execute(
        &self,
        tool: &dyn Tool,
        request: &ToolRequest,
        ctx: &ExecutionContext,
    ) -> ToolResult {
        let started = Instant::now();
        let result = self.run(tool, request, ctx, started).await;
        self.metrics.record_result(&result);

        match &result.error {
            None => info!(
                tier = ?result.quality_tier_used,
                attempts = result.attempts,
                elapsed_ms = result.execution_time.as_millis() as u64,
                "Tool succeeded"
            ),
            Some(err) => warn!(
                kind = %err.kind,
                attempts = result.attempts,
                "Tool failed: {}",
                err.message
            ),
        }

        result
    }

    async fn run(
        &self,
        tool: &dyn Tool,
        request: &ToolRequest,
        ctx: &ExecutionContext,
        started: Instant,
    ) -> ToolResult {
        let name = tool.name();

        if let Err(err) = tool.schema().validate(request).and_then(|_| tool.validate(request)) {
            return ToolResult::failure(name, err, None, 0, 0, started.elapsed());
        }

        let policy = self.retry.policy_for(name, tool.retry_policy());
        let max_attempts = policy.max_attempts.max(1);

        let mut tier = request.quality().unwrap_or(self.default_quality);
        let mut attempts = 0u32;
        let mut tier_attempts = 0u32;
        let mut degradations = 0u32;

        loop {
            if ctx.is_cancelled() {
                let last_tier = (attempts > 0).then_some(tier);
                return ToolResult::failure(
                    name,
                    ToolError::cancelled("Execution cancelled before next attempt"),
                    last_tier,
                    attempts,
                    degradations,
                    started.elapsed(),
                );
            }

            attempts += 1;
            tier_attempts += 1;
            debug!(attempt = attempts, %tier, "Executing tool");

            let err = match tool.execute(request, tier, ctx).await {
                Ok(payload) => {
                    return ToolResult::success(
                        name,
                        payload,
                        tier,
                        attempts,
                        degradations,
                        started.elapsed(),
                    );
                }
                Err(err) => err,
            };

            match err.kind {
                ErrorKind::Recoverable if tier_attempts < max_attempts => {
                    let delay = policy.delay_with_jitter(tier_attempts - 1, &mut rand::thread_rng());
                    warn!(
                        attempt = tier_attempts,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Recoverable failure, retrying: {}",
                        err.message
                    );

                    tokio::select! {
                        _ = ctx.token().cancelled() => {
                            return ToolResult::failure(
                                name,
                                ToolError::cancelled(format!(
                                    "Execution cancelled during backoff after: {}",
                                    err.message
                                )),
                                Some(tier),
                                attempts,
                                degradations,
                                started.elapsed(),
                            );
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                ErrorKind::Resource => match tier.step_down() {
                    Some(next) => {
                        let snapshot = self.monitor.sample();
                        warn!(
                            from = %tier,
                            to = %next,
                            cpu = snapshot.cpu_percent,
                            memory = snapshot.memory_percent,
                            disk = snapshot.disk_percent,
                            "Resource failure, degrading quality: {}",
                            err.message
                        );
                        tier = next;
                        tier_attempts = 0;
                        degradations += 1;
                    }
                    None => {
                        return ToolResult::failure(
                            name,
                            err,
                            Some(tier),
                            attempts,
                            degradations,
                            started.elapsed(),
                        );
                    }
                },
                // Validation, fatal, cancelled, or recoverable with the budget spent.
                _ => {
                    return ToolResult::failure(
                        name,
                        err,
                        Some(tier),
                        attempts,
                        degradations,
                        started.elapsed(),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::StaticResourceMonitor;
    use crate::tool::testing::ScriptedTool;
    use serde_json::json;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 10,
            multiplier: 2.0,
            max_delay_ms: 1_000,
            jitter_ms: 0,
        }
    }

    fn supervisor(policy: RetryPolicy) -> (Supervisor, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new(10));
        let retry = RetrySettings {
            default: policy,
            ..RetrySettings::default()
        };
        let supervisor = Supervisor::new(
            metrics.clone(),
            Arc::new(StaticResourceMonitor::idle()),
            retry,
            QualityTier::High,
        );
        (supervisor, metrics)
    }

    #[tokio::test]
    async fn test_recoverable_retried_exactly_max_attempts() {
        let (supervisor, metrics) = supervisor(fast_policy(3));
        let tool = ScriptedTool::new("flaky", |_, _| Err(ToolError::recoverable("rate limited")));

        let started = Instant::now();
        let result = supervisor
            .execute(&tool, &ToolRequest::new(), &ExecutionContext::new())
            .await;

        assert!(!result.is_success());
        assert_eq!(result.attempts, 3);
        assert_eq!(tool.calls(), vec![QualityTier::High; 3]);
        assert_eq!(result.error.unwrap().kind, ErrorKind::Recoverable);
        // Waits of 10ms then 20ms, and nothing unbounded on top.
        let elapsed = started.elapsed();
        let backoff: Duration = (0..2).map(|retry| fast_policy(3).backoff_delay(retry)).sum();
        assert!(elapsed >= backoff);
        assert!(elapsed < backoff + Duration::from_millis(500), "took {:?}", elapsed);

        let recorded = metrics.get("flaky").unwrap();
        assert_eq!(recorded.failure_count, 1);
        assert_eq!(recorded.retry_count, 2);
        assert_eq!(recorded.recent_errors.len(), 1);
    }

    #[tokio::test]
    async fn test_recoverable_then_success() {
        let (supervisor, metrics) = supervisor(fast_policy(3));
        let tool = ScriptedTool::new("flaky", |_, call| {
            if call < 2 {
                Err(ToolError::recoverable("timeout"))
            } else {
                Ok(json!({"ok": true}))
            }
        });

        let result = supervisor
            .execute(&tool, &ToolRequest::new(), &ExecutionContext::new())
            .await;

        assert!(result.is_success());
        assert_eq!(result.attempts, 3);
        assert_eq!(result.payload, Some(json!({"ok": true})));
        assert_eq!(metrics.get("flaky").unwrap().success_count, 1);
    }

    #[tokio::test]
    async fn test_resource_degrades_one_attempt_per_tier() {
        let (supervisor, _) = supervisor(fast_policy(3));
        let tool = ScriptedTool::new("heavy", |tier, _| match tier {
            QualityTier::High | QualityTier::Medium => Err(ToolError::resource("out of memory")),
            _ => Ok(json!({"tier": tier.as_str()})),
        });

        let result = supervisor
            .execute(&tool, &ToolRequest::new(), &ExecutionContext::new())
            .await;

        assert!(result.is_success());
        assert_eq!(result.quality_tier_used, Some(QualityTier::Low));
        assert_eq!(result.degradations, 2);
        assert_eq!(
            tool.calls(),
            vec![QualityTier::High, QualityTier::Medium, QualityTier::Low]
        );
    }

    #[tokio::test]
    async fn test_resource_at_minimal_fails() {
        let (supervisor, _) = supervisor(fast_policy(3));
        let tool = ScriptedTool::new("heavy", |_, _| Err(ToolError::resource("disk full")));

        let result = supervisor
            .execute(&tool, &ToolRequest::new(), &ExecutionContext::new())
            .await;

        assert!(!result.is_success());
        assert_eq!(result.attempts, 4);
        assert_eq!(result.quality_tier_used, Some(QualityTier::Minimal));
        assert_eq!(result.error.unwrap().kind, ErrorKind::Resource);
    }

    #[tokio::test]
    async fn test_requested_tier_is_starting_point() {
        let (supervisor, _) = supervisor(fast_policy(3));
        let tool = ScriptedTool::new("heavy", |_, _| Err(ToolError::resource("cpu")));

        let request = ToolRequest::new().with_param("quality", "low");
        let result = supervisor.execute(&tool, &request, &ExecutionContext::new()).await;

        assert_eq!(tool.calls(), vec![QualityTier::Low, QualityTier::Minimal]);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_validation_raised_by_tool_not_retried() {
        let (supervisor, metrics) = supervisor(fast_policy(5));
        let tool = ScriptedTool::new("strict", |_, _| Err(ToolError::validation("bad caption")));

        let result = supervisor
            .execute(&tool, &ToolRequest::new(), &ExecutionContext::new())
            .await;

        assert_eq!(result.attempts, 1);
        assert_eq!(tool.calls().len(), 1);
        assert_eq!(result.error.unwrap().kind, ErrorKind::Validation);
        assert_eq!(metrics.get("strict").unwrap().failure_count, 1);
    }

    #[tokio::test]
    async fn test_schema_failure_never_executes() {
        let (supervisor, _) = supervisor(fast_policy(5));
        let tool = ScriptedTool::new("strict", |_, _| Ok(json!(null))).requiring("input_path");

        let result = supervisor
            .execute(&tool, &ToolRequest::new(), &ExecutionContext::new())
            .await;

        assert_eq!(result.attempts, 0);
        assert!(tool.calls().is_empty());
        assert_eq!(result.quality_tier_used, None);
        assert_eq!(result.error.unwrap().kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_fatal_returns_immediately() {
        let (supervisor, _) = supervisor(fast_policy(5));
        let tool = ScriptedTool::new("broken", |_, _| Err(ToolError::fatal("segfault in codec")));

        let result = supervisor
            .execute(&tool, &ToolRequest::new(), &ExecutionContext::new())
            .await;

        assert_eq!(result.attempts, 1);
        assert_eq!(result.degradations, 0);
        assert_eq!(result.error.unwrap().message, "segfault in codec");
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let policy = RetryPolicy {
            base_delay_ms: 10_000,
            ..fast_policy(3)
        };
        let (supervisor, _) = supervisor(policy);
        let tool = ScriptedTool::new("flaky", |_, _| Err(ToolError::recoverable("timeout")));

        let token = CancellationToken::new();
        let ctx = ExecutionContext::with_token(token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let started = Instant::now();
        let result = supervisor.execute(&tool, &ToolRequest::new(), &ctx).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(tool.calls().len(), 1);
        assert_eq!(result.error.unwrap().kind, ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_pre_cancelled_context_runs_nothing() {
        let (supervisor, _) = supervisor(fast_policy(3));
        let tool = ScriptedTool::new("idle", |_, _| Ok(json!(null)));
        let ctx = ExecutionContext::new();
        ctx.cancel();

        let result = supervisor.execute(&tool, &ToolRequest::new(), &ctx).await;

        assert!(tool.calls().is_empty());
        assert_eq!(result.error.unwrap().kind, ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_tool_declared_policy_used() {
        let (supervisor, _) = supervisor(fast_policy(5));
        let tool = ScriptedTool::new("flaky", |_, _| Err(ToolError::recoverable("timeout")))
            .with_policy(fast_policy(2));

        let result = supervisor
            .execute(&tool, &ToolRequest::new(), &ExecutionContext::new())
            .await;

        assert_eq!(result.attempts, 2);
    }
}
