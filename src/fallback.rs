use serde_json::Value;

use crate::{ArgMap, FallbackMode, IntentResult, OracleError, ToolCall, TOOL_SEND_EMAIL};

pub(crate) const NO_INTENT_MESSAGE: &str =
    "I understood your command, but no actionable tool was needed.";

/// The fixed placeholder call substituted in canned-email mode.
pub(crate) fn canned_email_call() -> ToolCall {
    let mut args = ArgMap::new();
    args.insert(
        "to".to_string(),
        Value::String("test@example.com".to_string()),
    );
    args.insert(
        "subject".to_string(),
        Value::String("Fallback demo email".to_string()),
    );
    args.insert(
        "body".to_string(),
        Value::String(
            "This is a fallback email because the model did not return a tool call.".to_string(),
        ),
    );
    ToolCall::new(TOOL_SEND_EMAIL, args)
}

/// Decides what happens when resolution produced no actionable tool.
/// A resolver failure and a genuine no-intent are treated identically:
/// both land in the configured mode, nothing is inferred from the error.
pub(crate) struct FallbackPolicy {
    mode: FallbackMode,
}

impl FallbackPolicy {
    pub(crate) fn new(mode: FallbackMode) -> Self {
        Self { mode }
    }

    /// `None` means "answer the caller without invoking any handler".
    pub(crate) fn decide(&self, resolved: Result<IntentResult, OracleError>) -> Option<ToolCall> {
        let intent = match resolved {
            Ok(intent) => intent,
            Err(err) => {
                eprintln!("[fallback] oracle error treated as no intent: {err}");
                IntentResult::NoIntent
            }
        };
        match intent {
            IntentResult::Call(call) => Some(call),
            IntentResult::NoIntent => match self.mode {
                FallbackMode::Passive => None,
                FallbackMode::CannedEmail => Some(canned_email_call()),
            },
        }
    }
}
