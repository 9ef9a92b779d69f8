use crate::{IntentResult, OracleClient, OracleError, ToolRegistry, AUDIO_MIME};

/// Single instruction for the oracle: understand the utterance, then pick
/// at most one catalog tool with concrete arguments.
pub(crate) const INTENT_PROMPT: &str = "You are a voice assistant for a single \
authenticated user. First, understand the user's spoken command from the \
audio. Then, if appropriate, call one of the available tools: send_email, \
add_todo, or request_uber_ride. Infer reasonable email subjects/bodies and \
ride locations if needed. If the user is just chatting and no tool is \
needed, do not call any tool.";

/// Resolve raw audio into an intent. An `Err` here means the oracle round
/// trip itself failed; the caller hands it to the fallback policy, it is
/// never surfaced to the HTTP caller directly.
pub(crate) fn resolve(
    oracle: &OracleClient,
    registry: &ToolRegistry,
    audio: &[u8],
) -> Result<IntentResult, OracleError> {
    let picked = oracle.pick_tool(
        INTENT_PROMPT,
        audio,
        AUDIO_MIME,
        registry.function_declarations(),
    )?;
    Ok(match picked {
        Some(call) => IntentResult::Call(call),
        None => IntentResult::NoIntent,
    })
}
