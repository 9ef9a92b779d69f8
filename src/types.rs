use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw argument mapping as returned by the oracle, prior to validation.
pub(crate) type ArgMap = Map<String, Value>;

/// A resolved (or substituted) tool name plus concrete argument values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ToolCall {
    pub(crate) name: String,
    pub(crate) args: ArgMap,
}

impl ToolCall {
    pub(crate) fn new(name: &str, args: ArgMap) -> Self {
        Self {
            name: name.to_string(),
            args,
        }
    }
}

/// What the oracle made of the utterance.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum IntentResult {
    /// Conversational / no-op command; nothing to dispatch.
    NoIntent,
    Call(ToolCall),
}

/// Outcome returned to the HTTP caller. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct DispatchOutcome {
    pub(crate) status: String,
    pub(crate) called_tool: Option<String>,
    pub(crate) args: Value,
    pub(crate) message: String,
}

impl DispatchOutcome {
    pub(crate) fn ok(called_tool: Option<&str>, args: ArgMap, message: String) -> Self {
        Self {
            status: "ok".to_string(),
            called_tool: called_tool.map(|s| s.to_string()),
            args: Value::Object(args),
            message,
        }
    }

    pub(crate) fn error(called_tool: Option<&str>, args: ArgMap, message: String) -> Self {
        Self {
            status: "error".to_string(),
            called_tool: called_tool.map(|s| s.to_string()),
            args: Value::Object(args),
            message,
        }
    }

    pub(crate) fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TodoItem {
    pub(crate) task: String,
    pub(crate) due_date: Option<String>,
}

/// Structured reply expected from the oracle's speaker-verification prompt.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct VerifyVerdict {
    #[serde(default)]
    pub(crate) same_speaker: bool,
    #[serde(default)]
    pub(crate) similarity: f64,
}

/// Failure of an oracle round trip. The resolver surfaces this as an Err
/// branch; the fallback policy consumes it deterministically. It never
/// reaches the HTTP caller as a distinct error.
#[derive(Debug)]
pub(crate) enum OracleError {
    /// Unreachable, timed out, TLS failure.
    Transport(String),
    /// Non-2xx HTTP status from the oracle endpoint.
    Status(u16, String),
    /// Reply did not carry the expected shape.
    Malformed(String),
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::Transport(msg) => write!(f, "oracle transport: {msg}"),
            OracleError::Status(code, msg) => write!(f, "oracle status {code}: {msg}"),
            OracleError::Malformed(msg) => write!(f, "oracle reply malformed: {msg}"),
        }
    }
}

impl std::error::Error for OracleError {}

/// Biometric gate policy. Strict fails closed; demo accepts everyone and
/// exists for environments where enrollment is not required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GateMode {
    Strict,
    Demo,
}

impl GateMode {
    pub(crate) fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(GateMode::Strict),
            "demo" => Ok(GateMode::Demo),
            other => Err(format!("unknown gate mode '{other}' (expected strict|demo)")),
        }
    }
}

/// What to do when resolution yields no actionable tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FallbackMode {
    /// Report "no actionable tool" without invoking any handler.
    Passive,
    /// Substitute the fixed placeholder send_email call.
    CannedEmail,
}

impl FallbackMode {
    pub(crate) fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "passive" => Ok(FallbackMode::Passive),
            "canned-email" | "canned_email" => Ok(FallbackMode::CannedEmail),
            other => Err(format!(
                "unknown fallback mode '{other}' (expected passive|canned-email)"
            )),
        }
    }
}

/// One line in the daily command audit log.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CommandLogEntry {
    pub(crate) ts: String,
    pub(crate) user: String,
    pub(crate) status: String,
    pub(crate) called_tool: Option<String>,
    pub(crate) message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_mode_parse() {
        assert_eq!(GateMode::parse("strict").unwrap(), GateMode::Strict);
        assert_eq!(GateMode::parse(" Demo ").unwrap(), GateMode::Demo);
        assert!(GateMode::parse("open").is_err());
    }

    #[test]
    fn fallback_mode_parse() {
        assert_eq!(FallbackMode::parse("passive").unwrap(), FallbackMode::Passive);
        assert_eq!(
            FallbackMode::parse("canned-email").unwrap(),
            FallbackMode::CannedEmail
        );
        assert_eq!(
            FallbackMode::parse("CANNED_EMAIL").unwrap(),
            FallbackMode::CannedEmail
        );
        assert!(FallbackMode::parse("default").is_err());
    }

    #[test]
    fn outcome_serializes_all_fields() {
        let outcome = DispatchOutcome::ok(None, ArgMap::new(), "done".to_string());
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "ok");
        assert!(json["called_tool"].is_null());
        assert!(json["args"].is_object());
        assert_eq!(json["message"], "done");
    }
}
