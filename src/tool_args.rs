use serde::Deserialize;
use serde_json::Value;

use crate::{
    required_params, ToolCall, ToolRegistry, TOOL_ADD_TODO, TOOL_REQUEST_RIDE, TOOL_SEND_EMAIL,
};

#[derive(Debug, Deserialize)]
pub(crate) struct SendEmailArgs {
    pub(crate) to: String,
    pub(crate) subject: String,
    pub(crate) body: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddTodoArgs {
    pub(crate) task: String,
    #[serde(default)]
    pub(crate) due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RideArgs {
    #[allow(dead_code)]
    pub(crate) pickup: String,
    pub(crate) dropoff: String,
}

/// Closed set of validated invocations. Handlers only ever see one of
/// these, so a required field can never be absent at call time.
#[derive(Debug)]
pub(crate) enum ToolInvocation {
    SendEmail(SendEmailArgs),
    AddTodo(AddTodoArgs),
    RequestRide(RideArgs),
}

/// Validate a raw tool call against the registry schema and build the
/// typed invocation. Unknown argument keys are ignored; a missing
/// required field is rejected by name before any handler runs.
pub(crate) fn validate_call(
    registry: &ToolRegistry,
    call: &ToolCall,
) -> Result<ToolInvocation, String> {
    let Some(definition) = registry.get(&call.name) else {
        return Err(format!("Unknown tool: {}", call.name));
    };

    for param in required_params(definition) {
        let present = call
            .args
            .get(param)
            .map(|v| !v.is_null())
            .unwrap_or(false);
        if !present {
            return Err(format!(
                "Missing required argument '{param}' for {}.",
                call.name
            ));
        }
    }

    let args = Value::Object(call.args.clone());
    match call.name.as_str() {
        TOOL_SEND_EMAIL => serde_json::from_value(args)
            .map(ToolInvocation::SendEmail)
            .map_err(|e| format!("Invalid arguments for {}: {e}", call.name)),
        TOOL_ADD_TODO => serde_json::from_value(args)
            .map(ToolInvocation::AddTodo)
            .map_err(|e| format!("Invalid arguments for {}: {e}", call.name)),
        TOOL_REQUEST_RIDE => serde_json::from_value(args)
            .map(ToolInvocation::RequestRide)
            .map_err(|e| format!("Invalid arguments for {}: {e}", call.name)),
        other => Err(format!("Unknown tool: {other}")),
    }
}
