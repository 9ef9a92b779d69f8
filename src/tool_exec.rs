use url::form_urlencoded;

use crate::{
    validate_call, AddTodoArgs, DispatchOutcome, RideArgs, SendEmailArgs, TodoItem, TodoStore,
    ToolCall, ToolInvocation, ToolRegistry,
};

/// Validate a tool call against the registry and run the matching
/// handler. Validation failures and handler failures both come back as
/// error outcomes; nothing on this path panics the request.
pub(crate) fn dispatch(
    registry: &ToolRegistry,
    todos: &TodoStore,
    call: &ToolCall,
) -> DispatchOutcome {
    let invocation = match validate_call(registry, call) {
        Ok(invocation) => invocation,
        Err(message) => {
            return DispatchOutcome::error(Some(&call.name), call.args.clone(), message);
        }
    };

    let result = match invocation {
        ToolInvocation::SendEmail(args) => send_email(args),
        ToolInvocation::AddTodo(args) => add_todo(todos, args),
        ToolInvocation::RequestRide(args) => request_uber_ride(args),
    };

    match result {
        Ok(message) => DispatchOutcome::ok(Some(&call.name), call.args.clone(), message),
        Err(message) => DispatchOutcome::error(Some(&call.name), call.args.clone(), message),
    }
}

/// Mock transport: the email is logged on the server, nothing is sent.
pub(crate) fn send_email(args: SendEmailArgs) -> Result<String, String> {
    eprintln!(
        "[mock email] to: {} | subject: {}\n{}",
        args.to, args.subject, args.body
    );
    Ok(format!(
        "Email sent to {} with subject '{}'.",
        args.to, args.subject
    ))
}

pub(crate) fn add_todo(todos: &TodoStore, args: AddTodoArgs) -> Result<String, String> {
    let message = match &args.due_date {
        Some(due) => format!("Added task: '{}' (due {due}).", args.task),
        None => format!("Added task: '{}'.", args.task),
    };
    todos.append(TodoItem {
        task: args.task,
        due_date: args.due_date,
    });
    Ok(message)
}

/// Deep link opening the Uber app at the ride-request screen. Pickup is
/// pinned to the caller's current location; only the dropoff comes from
/// the utterance.
pub(crate) fn request_uber_ride(args: RideArgs) -> Result<String, String> {
    Ok(format!(
        "Uber deep link prepared: {}",
        ride_deep_link(&args.dropoff)
    ))
}

pub(crate) fn ride_deep_link(dropoff: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("action", "setPickup")
        .append_pair("pickup", "my_location")
        .append_pair("dropoff[formatted_address]", dropoff)
        .finish();
    format!("https://m.uber.com/ul/?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArgMap;
    use serde_json::Value;

    fn args(pairs: &[(&str, &str)]) -> ArgMap {
        let mut map = ArgMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), Value::String(v.to_string()));
        }
        map
    }

    #[test]
    fn dispatch_unknown_tool_never_runs_a_handler() {
        let registry = ToolRegistry::new();
        let todos = TodoStore::new();
        let call = ToolCall::new("fly_to_moon", ArgMap::new());
        let outcome = dispatch(&registry, &todos, &call);
        assert_eq!(outcome.status, "error");
        assert_eq!(outcome.message, "Unknown tool: fly_to_moon");
        assert!(todos.list_all().is_empty());
    }

    #[test]
    fn dispatch_missing_required_field_cites_it() {
        let registry = ToolRegistry::new();
        let todos = TodoStore::new();
        let call = ToolCall::new("send_email", args(&[("to", "a@b.com")]));
        let outcome = dispatch(&registry, &todos, &call);
        assert_eq!(outcome.status, "error");
        assert!(outcome.message.contains("subject"));
    }

    #[test]
    fn dispatch_send_email_confirms_recipient_and_subject() {
        let registry = ToolRegistry::new();
        let todos = TodoStore::new();
        let call = ToolCall::new(
            "send_email",
            args(&[("to", "a@b.com"), ("subject", "hi"), ("body", "text")]),
        );
        let outcome = dispatch(&registry, &todos, &call);
        assert!(outcome.is_ok());
        assert_eq!(outcome.called_tool.as_deref(), Some("send_email"));
        assert_eq!(outcome.message, "Email sent to a@b.com with subject 'hi'.");
    }

    #[test]
    fn dispatch_add_todo_grows_the_store_in_order() {
        let registry = ToolRegistry::new();
        let todos = TodoStore::new();
        let first = ToolCall::new("add_todo", args(&[("task", "buy milk")]));
        let second = ToolCall::new(
            "add_todo",
            args(&[("task", "call mom"), ("due_date", "today evening")]),
        );
        let out1 = dispatch(&registry, &todos, &first);
        let out2 = dispatch(&registry, &todos, &second);
        assert_eq!(out1.message, "Added task: 'buy milk'.");
        assert_eq!(out2.message, "Added task: 'call mom' (due today evening).");
        let items = todos.list_all();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].task, "buy milk");
        assert!(items[0].due_date.is_none());
        assert_eq!(items[1].task, "call mom");
    }

    #[test]
    fn dispatch_is_idempotent_on_validation() {
        let registry = ToolRegistry::new();
        let todos = TodoStore::new();
        let call = ToolCall::new(
            "request_uber_ride",
            args(&[("pickup", "home"), ("dropoff", "airport")]),
        );
        let out1 = dispatch(&registry, &todos, &call);
        let out2 = dispatch(&registry, &todos, &call);
        assert_eq!(out1.status, out2.status);
        assert_eq!(out1.message, out2.message);
        assert_eq!(out1.called_tool, out2.called_tool);
    }

    #[test]
    fn ride_deep_link_encodes_dropoff() {
        let url = ride_deep_link("221B Baker Street");
        assert!(url.starts_with("https://m.uber.com/ul/?"));
        assert!(url.contains("action=setPickup"));
        assert!(url.contains("pickup=my_location"));
        assert!(url.contains("dropoff%5Bformatted_address%5D=221B+Baker+Street"));
    }

    #[test]
    fn ride_pickup_argument_is_ignored_in_the_link() {
        let registry = ToolRegistry::new();
        let todos = TodoStore::new();
        let call = ToolCall::new(
            "request_uber_ride",
            args(&[("pickup", "ignored"), ("dropoff", "221B Baker Street")]),
        );
        let outcome = dispatch(&registry, &todos, &call);
        assert!(outcome.is_ok());
        assert!(outcome.message.contains("pickup=my_location"));
        assert!(!outcome.message.contains("pickup=ignored"));
    }
}
