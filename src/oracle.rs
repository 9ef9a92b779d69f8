use std::time::Duration;

use base64::Engine;
use serde_json::Value;

use crate::{ArgMap, OracleConfig, OracleError, ToolCall, VerifyVerdict};

/// Sent ahead of the two audio clips when verifying a speaker.
const VERIFY_PROMPT: &str = "You are a speaker verification system. \
You will receive two audio clips: enrolled voice, then live voice. \
Return ONLY a JSON object with fields `same_speaker` (true/false) \
and `similarity` (number between 0 and 1).";

/// Blocking client for the external Intent Oracle (Gemini REST).
/// Every round trip is bounded by the configured timeout; failures are
/// reported as `OracleError` and never retried here.
pub(crate) struct OracleClient {
    agent: ureq::Agent,
    config: OracleConfig,
}

impl OracleClient {
    pub(crate) fn new(config: OracleConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(config.timeout)
            .timeout_read(config.timeout)
            .timeout_write(config.timeout)
            .build();
        Self { agent, config }
    }

    fn generate(&self, payload: &Value) -> Result<Value, OracleError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let response = self
            .agent
            .post(&url)
            .set("content-type", "application/json")
            .set("x-goog-api-key", &self.config.api_key)
            .send_json(payload.clone());
        match response {
            Ok(resp) => resp
                .into_json::<Value>()
                .map_err(|e| OracleError::Malformed(format!("response body: {e}"))),
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                Err(OracleError::Status(code, truncate(&text, 200)))
            }
            Err(ureq::Error::Transport(err)) => Err(OracleError::Transport(err.to_string())),
        }
    }

    /// Ask the oracle to interpret the spoken command and pick at most one
    /// tool from the catalog. `Ok(None)` means the oracle answered but
    /// selected nothing (conversational utterance).
    pub(crate) fn pick_tool(
        &self,
        instruction: &str,
        audio: &[u8],
        mime: &str,
        function_declarations: Value,
    ) -> Result<Option<ToolCall>, OracleError> {
        let payload = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": instruction },
                    { "inlineData": { "mimeType": mime, "data": encode_audio(audio) } }
                ]
            }],
            "tools": function_declarations,
        });
        let response = self.generate(&payload)?;
        Ok(first_function_call(&response))
    }

    /// Compare an enrolled sample against a live one. Any reply that does
    /// not parse into a verdict is an error; the gate fails closed on it.
    pub(crate) fn verify_speakers(
        &self,
        enrolled: &[u8],
        live: &[u8],
        mime: &str,
    ) -> Result<VerifyVerdict, OracleError> {
        let payload = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": VERIFY_PROMPT },
                    { "inlineData": { "mimeType": mime, "data": encode_audio(enrolled) } },
                    { "inlineData": { "mimeType": mime, "data": encode_audio(live) } }
                ]
            }],
        });
        let response = self.generate(&payload)?;
        parse_verify_verdict(&response)
    }
}

fn encode_audio(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Concatenate the text parts of every candidate into one string.
pub(crate) fn extract_text(response: &Value) -> String {
    let mut texts = Vec::new();
    let candidates = response
        .get("candidates")
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();
    for candidate in &candidates {
        let parts = candidate
            .get("content")
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.as_array());
        let Some(parts) = parts else { continue };
        for part in parts {
            if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                if !text.is_empty() {
                    texts.push(text.to_string());
                }
            }
        }
    }
    texts.join("\n").trim().to_string()
}

/// First function call in the first candidate, if any. Later suggestions
/// are ignored; one tool call per request is honored.
pub(crate) fn first_function_call(response: &Value) -> Option<ToolCall> {
    let candidate = response
        .get("candidates")
        .and_then(|v| v.as_array())
        .and_then(|c| c.first())?;
    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())?;
    for part in parts {
        let Some(call) = part.get("functionCall") else {
            continue;
        };
        let name = call.get("name").and_then(|n| n.as_str())?;
        let args: ArgMap = call
            .get("args")
            .and_then(|a| a.as_object())
            .cloned()
            .unwrap_or_default();
        return Some(ToolCall::new(name, args));
    }
    None
}

/// Models often wrap JSON replies in markdown fences; strip them before
/// parsing.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

pub(crate) fn parse_verify_verdict(response: &Value) -> Result<VerifyVerdict, OracleError> {
    let text = extract_text(response);
    if text.is_empty() {
        return Err(OracleError::Malformed("empty verdict".to_string()));
    }
    serde_json::from_str::<VerifyVerdict>(strip_json_fences(&text))
        .map_err(|e| OracleError::Malformed(format!("verdict: {e}")))
}
