use serde_json::{self, Value};

pub(crate) const TOOL_SEND_EMAIL: &str = "send_email";
pub(crate) const TOOL_ADD_TODO: &str = "add_todo";
pub(crate) const TOOL_REQUEST_RIDE: &str = "request_uber_ride";

/// Static catalog of the actions the gateway can perform. The same schemas
/// are handed to the oracle as function declarations and consulted for
/// argument validation before dispatch.
pub(crate) fn tool_definitions_json() -> Vec<Value> {
    vec![
        serde_json::json!({
            "name": TOOL_SEND_EMAIL,
            "description": "Send an email on behalf of the user.",
            "parameters": {
                "type": "object",
                "properties": {
                    "to": { "type": "string", "description": "Recipient email address" },
                    "subject": { "type": "string" },
                    "body": { "type": "string" }
                },
                "required": ["to", "subject", "body"]
            }
        }),
        serde_json::json!({
            "name": TOOL_ADD_TODO,
            "description": "Add a new task to the user's to-do list.",
            "parameters": {
                "type": "object",
                "properties": {
                    "task": { "type": "string" },
                    "due_date": {
                        "type": "string",
                        "description": "Optional due date, e.g. 'today evening' or '2025-11-18'"
                    }
                },
                "required": ["task"]
            }
        }),
        serde_json::json!({
            "name": TOOL_REQUEST_RIDE,
            "description": "Prepare a deep link URL to request an Uber ride.",
            "parameters": {
                "type": "object",
                "properties": {
                    "pickup": { "type": "string", "description": "Pickup location description" },
                    "dropoff": { "type": "string", "description": "Dropoff location description" }
                },
                "required": ["pickup", "dropoff"]
            }
        }),
    ]
}

/// Immutable tool catalog, built once at startup.
#[derive(Debug, Clone)]
pub(crate) struct ToolRegistry {
    tools: Vec<Value>,
}

impl ToolRegistry {
    pub(crate) fn new() -> Self {
        Self {
            tools: tool_definitions_json(),
        }
    }

    pub(crate) fn list(&self) -> &[Value] {
        &self.tools
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.tools
            .iter()
            .find(|tool| tool.get("name").and_then(|v| v.as_str()) == Some(name))
    }

    /// Catalog in the oracle's function-declaration wire shape.
    pub(crate) fn function_declarations(&self) -> Value {
        serde_json::json!([{ "functionDeclarations": self.tools }])
    }
}

/// Required parameter names declared by a tool definition.
pub(crate) fn required_params(definition: &Value) -> Vec<&str> {
    definition
        .get("parameters")
        .and_then(|p| p.get("required"))
        .and_then(|r| r.as_array())
        .map(|items| items.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default()
}
