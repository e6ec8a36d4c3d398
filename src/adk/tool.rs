// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of an action a model may call.
///
/// The model never executes anything itself: it only picks one of the offered
/// specs and fills in arguments matching `schema`. Executing the choice is the
/// caller's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSpec {
    /// Unique name within one request
    pub name: String,
    /// Human-readable description shown to the model
    pub description: String,
    /// JSON schema for the call arguments
    pub schema: Value,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_tool_spec() {
        let spec = ToolSpec::new(
            "search_web",
            "Search the Web",
            json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        );
        assert_eq!(spec.name, "search_web");
        assert_eq!(spec.schema["properties"]["query"]["type"], "string");
    }
}
