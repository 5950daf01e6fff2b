//! Per-tool execution metrics.
//!
//! Each tool has its own record behind its own lock, so concurrent calls to
//! unrelated tools never contend. Counters only grow until an explicit reset.

use crate::error::ErrorKind;
use crate::supervisor::{ToolResult, ToolStatus};
use crate::tool::QualityTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

/// A failed execution, kept in a tool's bounded error history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub execution_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: ErrorKind,
    pub message: String,
    /// Tier of the last attempt, if any attempt ran.
    pub tier: Option<QualityTier>,
    pub attempts: u32,
}

/// Counters and history for one tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolMetrics {
    pub execution_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Same-tier re-attempts after a recoverable failure, across all executions.
    /// Attempts that follow a tier step-down count in `degradation_count` only.
    pub retry_count: u64,
    /// Quality tier step-downs, across all executions.
    pub degradation_count: u64,
    pub total_execution_seconds: f64,
    pub last_execution: Option<DateTime<Utc>>,
    pub recent_errors: VecDeque<ErrorRecord>,
}

impl ToolMetrics {
    /// Failures over executions; 0.0 when the tool never ran.
    pub fn failure_rate(&self) -> f64 {
        if self.execution_count == 0 {
            return 0.0;
        }
        self.failure_count as f64 / self.execution_count as f64
    }

    pub fn average_execution_seconds(&self) -> f64 {
        if self.execution_count == 0 {
            return 0.0;
        }
        self.total_execution_seconds / self.execution_count as f64
    }

    fn apply(&mut self, result: &ToolResult, error_history: usize) {
        self.execution_count += 1;
        let retries = result
            .attempts
            .saturating_sub(1)
            .saturating_sub(result.degradations);
        self.retry_count += u64::from(retries);
        self.degradation_count += u64::from(result.degradations);
        self.total_execution_seconds += result.execution_time.as_secs_f64();
        self.last_execution = Some(result.finished_at);

        match result.status {
            ToolStatus::Success => self.success_count += 1,
            ToolStatus::Failure => {
                self.failure_count += 1;
                if let Some(error) = &result.error {
                    self.recent_errors.push_back(ErrorRecord {
                        execution_id: result.execution_id,
                        timestamp: result.finished_at,
                        kind: error.kind,
                        message: error.message.clone(),
                        tier: result.quality_tier_used,
                        attempts: result.attempts,
                    });
                }
                while self.recent_errors.len() > error_history {
                    self.recent_errors.pop_front();
                }
            }
        }
    }
}

/// Registry of per-tool metrics, owned by the toolset manager.
pub struct MetricsRegistry {
    records: RwLock<HashMap<String, Arc<Mutex<ToolMetrics>>>>,
    error_history: usize,
}

impl MetricsRegistry {
    /// Create a registry keeping `error_history` errors per tool.
    pub fn new(error_history: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            error_history,
        }
    }

    /// Ensure a record exists for `tool`.
    pub fn register(&self, tool: &str) {
        self.record(tool);
    }

    fn record(&self, tool: &str) -> Arc<Mutex<ToolMetrics>> {
        {
            let records = match self.records.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(record) = records.get(tool) {
                return record.clone();
            }
        }

        let mut records = match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.entry(tool.to_string()).or_default().clone()
    }

    /// Fold one finished execution into the tool's record.
    pub fn record_result(&self, result: &ToolResult) {
        let record = self.record(&result.tool);
        let mut metrics = match record.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        metrics.apply(result, self.error_history);
    }

    /// Copy of one tool's metrics.
    pub fn get(&self, tool: &str) -> Option<ToolMetrics> {
        let records = match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.get(tool).map(|record| match record.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        })
    }

    /// Copy of every tool's metrics, sorted by tool name.
    pub fn snapshot(&self) -> BTreeMap<String, ToolMetrics> {
        let records = match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records
            .iter()
            .map(|(name, record)| {
                let metrics = match record.lock() {
                    Ok(guard) => guard.clone(),
                    Err(poisoned) => poisoned.into_inner().clone(),
                };
                (name.clone(), metrics)
            })
            .collect()
    }

    /// Zero every record. Operator action only.
    pub fn reset(&self) {
        let records = match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for record in records.values() {
            let mut metrics = match record.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *metrics = ToolMetrics::default();
        }
        info!("Reset metrics for {} tools", records.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use std::time::Duration;

    fn failure(tool: &str, message: &str) -> ToolResult {
        ToolResult::failure(
            tool,
            ToolError::recoverable(message),
            Some(QualityTier::High),
            3,
            0,
            Duration::from_millis(30),
        )
    }

    #[test]
    fn test_counts_and_rates() {
        let registry = MetricsRegistry::new(5);
        registry.record_result(&ToolResult::success(
            "video_analysis",
            serde_json::json!({}),
            QualityTier::Medium,
            1,
            1,
            Duration::from_millis(100),
        ));
        registry.record_result(&failure("video_analysis", "timeout"));

        let metrics = registry.get("video_analysis").unwrap();
        assert_eq!(metrics.execution_count, 2);
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.failure_count, 1);
        assert_eq!(metrics.retry_count, 2);
        assert_eq!(metrics.degradation_count, 1);
        assert_eq!(metrics.failure_rate(), 0.5);
        assert!((metrics.total_execution_seconds - 0.13).abs() < 1e-9);
        assert!(metrics.last_execution.is_some());
        assert_eq!(metrics.recent_errors.len(), 1);
    }

    #[test]
    fn test_step_downs_are_not_retries() {
        let registry = MetricsRegistry::new(5);
        // High fails on resources, Medium fails twice recoverably, then succeeds.
        registry.record_result(&ToolResult::success(
            "audio_processing",
            serde_json::json!({}),
            QualityTier::Medium,
            4,
            1,
            Duration::from_millis(10),
        ));
        // Degraded from High straight down to Minimal.
        registry.record_result(&ToolResult::success(
            "audio_processing",
            serde_json::json!({}),
            QualityTier::Minimal,
            4,
            3,
            Duration::from_millis(10),
        ));

        let metrics = registry.get("audio_processing").unwrap();
        assert_eq!(metrics.retry_count, 2);
        assert_eq!(metrics.degradation_count, 4);
    }

    #[test]
    fn test_error_history_evicts_oldest() {
        let registry = MetricsRegistry::new(2);
        for i in 0..4 {
            registry.record_result(&failure("audio_processing", &format!("e{}", i)));
        }
        let metrics = registry.get("audio_processing").unwrap();
        let messages: Vec<_> = metrics.recent_errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["e2", "e3"]);
        assert_eq!(metrics.failure_count, 4);
    }

    #[test]
    fn test_reset_and_registered_tools() {
        let registry = MetricsRegistry::new(2);
        registry.register("content_scheduling");
        registry.record_result(&failure("audio_processing", "x"));

        assert_eq!(registry.snapshot().len(), 2);
        assert_eq!(registry.get("content_scheduling").unwrap().failure_rate(), 0.0);

        registry.reset();
        assert_eq!(registry.get("audio_processing").unwrap(), ToolMetrics::default());
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let registry = Arc::new(MetricsRegistry::new(10));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let tool = if t % 2 == 0 { "a" } else { "b" };
                        if i % 4 == 0 {
                            registry.record_result(&failure(tool, "boom"));
                        } else {
                            registry.record_result(&ToolResult::success(
                                tool,
                                serde_json::Value::Null,
                                QualityTier::High,
                                1,
                                0,
                                Duration::ZERO,
                            ));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for tool in ["a", "b"] {
            let metrics = registry.get(tool).unwrap();
            assert_eq!(metrics.execution_count, 400);
            assert_eq!(metrics.failure_count, 100);
            assert_eq!(metrics.success_count, 300);
            assert_eq!(metrics.recent_errors.len(), 10);
        }
    }
}
