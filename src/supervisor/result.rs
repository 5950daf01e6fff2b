//! Outcome of one supervised tool execution.

use crate::error::ToolError;
use crate::tool::QualityTier;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

/// Whether an execution produced a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Failure,
}

/// Result handed back to the caller. The engine keeps only the metrics derived from it.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub execution_id: Uuid,
    pub tool: String,
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    /// Tier of the successful (or last) attempt; `None` when nothing ran.
    pub quality_tier_used: Option<QualityTier>,
    pub attempts: u32,
    /// Number of tier step-downs taken.
    pub degradations: u32,
    #[serde(rename = "execution_time_ms", serialize_with = "as_millis")]
    pub execution_time: Duration,
    pub finished_at: DateTime<Utc>,
}

impl ToolResult {
    pub fn success(
        tool: &str,
        payload: Value,
        tier: QualityTier,
        attempts: u32,
        degradations: u32,
        execution_time: Duration,
    ) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            tool: tool.to_string(),
            status: ToolStatus::Success,
            payload: Some(payload),
            error: None,
            quality_tier_used: Some(tier),
            attempts,
            degradations,
            execution_time,
            finished_at: Utc::now(),
        }
    }

    pub fn failure(
        tool: &str,
        error: ToolError,
        tier: Option<QualityTier>,
        attempts: u32,
        degradations: u32,
        execution_time: Duration,
    ) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            tool: tool.to_string(),
            status: ToolStatus::Failure,
            payload: None,
            error: Some(error),
            quality_tier_used: tier,
            attempts,
            degradations,
            execution_time,
            finished_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_shape() {
        let result = ToolResult::failure(
            "audio_processing",
            ToolError::resource("out of memory"),
            Some(QualityTier::Minimal),
            4,
            3,
            Duration::from_millis(1500),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error"]["kind"], "resource");
        assert_eq!(json["quality_tier_used"], "minimal");
        assert_eq!(json["execution_time_ms"], 1500.0);
        assert!(json.get("payload").is_none());
    }
}
