//! Tool requests and the execution context they run under.

use super::QualityTier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// Parameters submitted to a tool.
///
/// Built up front with [`ToolRequest::with_param`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolRequest {
    params: Map<String, Value>,
}

impl ToolRequest {
    /// Create an empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a request from an existing parameter map.
    pub fn from_params(params: Map<String, Value>) -> Self {
        Self { params }
    }

    /// Create a request from a JSON object. Non-object values yield `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(params) => Some(Self { params }),
            _ => None,
        }
    }

    /// Return a copy of this request with one parameter set.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_f64)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }

    /// Whether side-effecting actions should be suppressed.
    pub fn dry_run(&self) -> bool {
        self.get_bool("dry_run").unwrap_or(false)
    }

    /// Requested quality tier, if present and well-formed.
    pub fn quality(&self) -> Option<QualityTier> {
        self.get_str("quality").and_then(|q| q.parse().ok())
    }

    pub fn into_params(self) -> Map<String, Value> {
        self.params
    }
}

/// Context shared by every attempt of one execution.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the execution to an existing cancellation token.
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Request cancellation of this execution and any derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A child context cancelled together with this one.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
        }
    }
}
