//! `key=value` parameter parsing for the run and workflow commands.

use crate::tool::ToolRequest;
use anyhow::{bail, Result};
use serde_json::Value;

/// Build a request from `key=value` pairs.
///
/// Values that parse as JSON (`3`, `true`, `[1,2]`) keep their type; anything
/// else is taken as a string.
pub fn parse_params(pairs: &[String]) -> Result<ToolRequest> {
    let mut request = ToolRequest::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Invalid parameter '{}', expected key=value", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid parameter '{}', key is empty", pair);
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        request = request.with_param(key, value);
    }
    Ok(request)
}
