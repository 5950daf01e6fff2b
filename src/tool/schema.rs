//! Parameter schemas and request validation.

use super::{QualityTier, ToolRequest};
use crate::error::ToolError;
use serde::Serialize;
use serde_json::{json, Value};

/// JSON type a parameter must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
    Any,
}

impl ParamKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Integer => value.is_u64() || value.is_i64(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Array => value.is_array(),
            ParamKind::Object => value.is_object(),
            ParamKind::Any => true,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
            ParamKind::Any => "any",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub description: String,
    /// Allowed string values, for enumerated parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ParamSpec {
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
            description: description.to_string(),
            allowed: None,
        }
    }

    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Restrict a string parameter to a fixed set of values.
    pub fn one_of<S: AsRef<str>>(mut self, values: &[S]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.as_ref().to_string()).collect());
        self
    }
}

/// The full parameter schema of a tool.
///
/// `dry_run` and `quality` are accepted by every tool and are checked here
/// even when a tool does not declare them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolSchema {
    pub params: Vec<ParamSpec>,
}

impl ToolSchema {
    pub fn new(params: Vec<ParamSpec>) -> Self {
        Self { params }
    }

    /// Check a request against this schema.
    pub fn validate(&self, request: &ToolRequest) -> Result<(), ToolError> {
        if let Some(value) = request.get("dry_run") {
            if !value.is_boolean() {
                return Err(ToolError::validation("Parameter 'dry_run' must be a boolean"));
            }
        }

        if let Some(value) = request.get("quality") {
            let tier = value.as_str().map(str::parse::<QualityTier>);
            if !matches!(tier, Some(Ok(_))) {
                return Err(ToolError::validation(format!(
                    "Parameter 'quality' must be one of high, medium, low, minimal (got {})",
                    value
                )));
            }
        }

        for spec in &self.params {
            let value = match request.get(&spec.name) {
                Some(Value::Null) | None if spec.required => {
                    return Err(ToolError::validation(format!(
                        "Missing required parameter '{}'",
                        spec.name
                    )));
                }
                Some(Value::Null) | None => continue,
                Some(value) => value,
            };

            if !spec.kind.matches(value) {
                return Err(ToolError::validation(format!(
                    "Parameter '{}' must be of type {}",
                    spec.name,
                    spec.kind.as_str()
                )));
            }

            if let Some(allowed) = &spec.allowed {
                let ok = value
                    .as_str()
                    .is_some_and(|v| allowed.iter().any(|a| a.eq_ignore_ascii_case(v)));
                if !ok {
                    return Err(ToolError::validation(format!(
                        "Parameter '{}' must be one of: {}",
                        spec.name,
                        allowed.join(", ")
                    )));
                }
            }
        }

        Ok(())
    }

    /// JSON-schema style description, for listing tools.
    pub fn to_json(&self) -> Value {
        let mut properties = serde_json::Map::new();
        for spec in &self.params {
            let mut prop = json!({
                "type": spec.kind.as_str(),
                "description": spec.description,
            });
            if let Some(allowed) = &spec.allowed {
                prop["enum"] = json!(allowed);
            }
            properties.insert(spec.name.clone(), prop);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
