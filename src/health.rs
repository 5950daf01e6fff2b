//! Health classification from resource readings and tool failure rates.

use crate::config::HealthSettings;
use crate::metrics::ToolMetrics;
use crate::monitor::ResourceSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tri-state health classification, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Warning => write!(f, "warning"),
            HealthStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Snapshot returned by the manager's health query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub resources: ResourceSnapshot,
    /// Failure rate per tool, 0.0 for tools that never ran.
    pub tool_failure_rates: BTreeMap<String, f64>,
    /// Human-readable reasons for any non-healthy status.
    pub reasons: Vec<String>,
}

/// Combine a resource reading and tool metrics into a report.
pub fn evaluate(
    resources: ResourceSnapshot,
    metrics: &BTreeMap<String, ToolMetrics>,
    thresholds: &HealthSettings,
) -> HealthReport {
    let mut status = HealthStatus::Healthy;
    let mut reasons = Vec::new();

    let resource_status = resources.classify(thresholds);
    if resource_status > HealthStatus::Healthy {
        let mark = match resource_status {
            HealthStatus::Critical => thresholds.resource_critical_percent,
            _ => thresholds.resource_warning_percent,
        };
        for (name, value) in resources.over(mark) {
            reasons.push(format!("{} usage at {:.1}% (limit {:.1}%)", name, value, mark));
        }
        status = status.max(resource_status);
    }

    let mut tool_failure_rates = BTreeMap::new();
    for (name, record) in metrics {
        let rate = record.failure_rate();
        tool_failure_rates.insert(name.clone(), rate);

        let tool_status = if rate > thresholds.failure_rate_critical {
            HealthStatus::Critical
        } else if rate > thresholds.failure_rate_warning {
            HealthStatus::Warning
        } else {
            continue;
        };

        reasons.push(format!(
            "tool '{}' failure rate {:.0}% ({} of {} executions)",
            name,
            rate * 100.0,
            record.failure_count,
            record.execution_count
        ));
        status = status.max(tool_status);
    }

    HealthReport {
        status,
        resources,
        tool_failure_rates,
        reasons,
    }
}
