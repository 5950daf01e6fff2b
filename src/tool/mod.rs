//! The tool contract.
//!
//! A tool is a named unit of work with a declared parameter schema and a
//! quality-tiered `execute`. Tools never retry or degrade on their own; they
//! raise a classified [`ToolError`] and the supervisor decides what happens next.

mod registry;
mod request;
mod schema;
#[cfg(test)]
pub(crate) mod testing;

pub use registry::ToolRegistry;
pub use request::{ExecutionContext, ToolRequest};
pub use schema::{ParamKind, ParamSpec, ToolSchema};

use crate::error::ToolError;
use crate::supervisor::RetryPolicy;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered quality levels a tool can run at, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    #[default]
    High,
    Medium,
    Low,
    Minimal,
}

impl QualityTier {
    /// All tiers in degradation order.
    pub const ALL: [QualityTier; 4] = [
        QualityTier::High,
        QualityTier::Medium,
        QualityTier::Low,
        QualityTier::Minimal,
    ];

    /// Position of this tier in [`QualityTier::ALL`].
    pub fn index(self) -> usize {
        match self {
            QualityTier::High => 0,
            QualityTier::Medium => 1,
            QualityTier::Low => 2,
            QualityTier::Minimal => 3,
        }
    }

    /// The next lower tier, or `None` at `Minimal`.
    pub fn step_down(self) -> Option<QualityTier> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
            QualityTier::Minimal => "minimal",
        }
    }
}

impl std::str::FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            "minimal" => Ok(QualityTier::Minimal),
            _ => Err(format!("Unknown quality tier: {}", s)),
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, schema-described unit of work.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Registry key for this tool.
    fn name(&self) -> &str;

    /// One-line human description.
    fn description(&self) -> &str;

    /// Declared parameters. Checked by the supervisor before `validate`.
    fn schema(&self) -> ToolSchema;

    /// Retry policy this tool prefers. Configuration overrides take precedence.
    fn retry_policy(&self) -> Option<RetryPolicy> {
        None
    }

    /// Semantic checks beyond the schema (cross-field rules, value ranges).
    fn validate(&self, _request: &ToolRequest) -> Result<(), ToolError> {
        Ok(())
    }

    /// Run the tool once at the given tier.
    async fn execute(
        &self,
        request: &ToolRequest,
        tier: QualityTier,
        ctx: &ExecutionContext,
    ) -> Result<Value, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_order_and_step_down() {
        assert!(QualityTier::High < QualityTier::Medium);
        assert!(QualityTier::Low < QualityTier::Minimal);
        assert_eq!(QualityTier::High.step_down(), Some(QualityTier::Medium));
        assert_eq!(QualityTier::Low.step_down(), Some(QualityTier::Minimal));
        assert_eq!(QualityTier::Minimal.step_down(), None);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("HIGH".parse::<QualityTier>().unwrap(), QualityTier::High);
        assert_eq!("minimal".parse::<QualityTier>().unwrap(), QualityTier::Minimal);
        assert!("ultra".parse::<QualityTier>().is_err());
    }
}
