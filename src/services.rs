use std::io::{self, Read};
use std::path::PathBuf;

use serde_json::{self, Value};
use tiny_http::{Header, Method, Request, Response, Server};
use url::form_urlencoded;

use crate::{
    append_command_log, dispatch, log_entry, resolver, ArgMap, BiometricGate, DispatchOutcome,
    FallbackPolicy, IntentResult, OracleClient, OracleConfig, OracleError, ServeConfig, TodoStore,
    ToolRegistry, VoiceprintStore, NO_INTENT_MESSAGE,
};

const INDEX_HTML: &str = include_str!("../assets/index.html");
const DEFAULT_USER: &str = "default_user";

/// Everything a request handler needs, built once at startup.
pub(crate) struct AppState {
    pub(crate) registry: ToolRegistry,
    pub(crate) todos: TodoStore,
    pub(crate) profiles: VoiceprintStore,
    pub(crate) gate: BiometricGate,
    pub(crate) fallback: FallbackPolicy,
    pub(crate) log_dir: PathBuf,
}

pub(crate) fn run_server(
    serve: ServeConfig,
    oracle_config: OracleConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let oracle = OracleClient::new(oracle_config);
    let state = AppState {
        registry: ToolRegistry::new(),
        todos: TodoStore::new(),
        profiles: VoiceprintStore::new(serve.voiceprint_dir.clone())?,
        gate: BiometricGate::new(serve.gate_mode, serve.verify_threshold),
        fallback: FallbackPolicy::new(serve.fallback_mode),
        log_dir: serve.log_dir.clone(),
    };

    let addr = format!("{}:{}", serve.bind, serve.port);
    let server = Server::http(&addr)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("server: {e}")))?;
    eprintln!(
        "[voxgate] listening on http://{addr} (gate={:?}, fallback={:?})",
        serve.gate_mode, serve.fallback_mode
    );

    for request in server.incoming_requests() {
        let url = request.url().to_string();
        let (path, query) = split_url(&url);
        let method = request.method().clone();
        match (method, path) {
            (Method::Get, "/") => {
                respond_html(request, INDEX_HTML);
            }
            (Method::Get, "/api/todos") => {
                let todos = state.todos.list_all();
                respond_json(request, 200, &serde_json::json!({ "todos": todos }));
            }
            (Method::Post, "/api/enroll-voice") => {
                handle_enroll(&state, request, query);
            }
            (Method::Post, "/api/voice-command") => {
                handle_voice_command(&state, &oracle, request, query);
            }
            _ => {
                respond_json(
                    request,
                    404,
                    &serde_json::json!({ "status": "error", "message": "Not found." }),
                );
            }
        }
    }
    Ok(())
}

fn handle_enroll(state: &AppState, mut request: Request, query: &str) {
    let user_id = query_param(query, "user_id").unwrap_or_else(|| DEFAULT_USER.to_string());
    let Some(audio) = read_audio_part(&mut request) else {
        respond_json(
            request,
            400,
            &serde_json::json!({ "status": "error", "message": "No audio file provided." }),
        );
        return;
    };
    match state.profiles.save(&user_id, &audio) {
        Ok(()) => {
            eprintln!("[enroll] stored voiceprint for {user_id} ({} bytes)", audio.len());
            respond_json(
                request,
                200,
                &serde_json::json!({
                    "status": "ok",
                    "message": format!("Voice enrolled for {user_id}.")
                }),
            );
        }
        Err(err) => {
            eprintln!("[enroll] failed to store voiceprint for {user_id}: {err}");
            respond_json(
                request,
                500,
                &serde_json::json!({ "status": "error", "message": "Failed to store voiceprint." }),
            );
        }
    }
}

fn handle_voice_command(state: &AppState, oracle: &OracleClient, mut request: Request, query: &str) {
    let user_id = query_param(query, "user_id").unwrap_or_else(|| DEFAULT_USER.to_string());
    let Some(audio) = read_audio_part(&mut request) else {
        respond_json(
            request,
            400,
            &serde_json::json!({ "status": "error", "message": "No audio file provided." }),
        );
        return;
    };

    if !state.gate.verify(oracle, &state.profiles, &user_id, &audio) {
        let entry = log_entry(&user_id, "denied", None, "Voice authentication failed.");
        if let Err(err) = append_command_log(&state.log_dir, &entry) {
            eprintln!("[audit] write failed: {err}");
        }
        respond_json(
            request,
            401,
            &serde_json::json!({ "status": "error", "message": "Voice authentication failed." }),
        );
        return;
    }

    let outcome = run_voice_pipeline(state, oracle, &audio);
    let entry = log_entry(
        &user_id,
        &outcome.status,
        outcome.called_tool.as_deref(),
        &outcome.message,
    );
    if let Err(err) = append_command_log(&state.log_dir, &entry) {
        eprintln!("[audit] write failed: {err}");
    }

    match serde_json::to_value(&outcome) {
        Ok(body) => respond_json(request, 200, &body),
        Err(err) => {
            eprintln!("[serve] outcome serialization failed: {err}");
            respond_json(
                request,
                500,
                &serde_json::json!({ "status": "error", "message": "Internal error." }),
            );
        }
    }
}

/// Resolve audio into an intent, apply the fallback policy, dispatch.
/// Always completes with a structured outcome; oracle failures are folded
/// into the fallback path.
pub(crate) fn run_voice_pipeline(
    state: &AppState,
    oracle: &OracleClient,
    audio: &[u8],
) -> DispatchOutcome {
    let resolved = resolver::resolve(oracle, &state.registry, audio);
    finish_resolved(state, resolved)
}

/// Second half of the pipeline, after the oracle round trip.
pub(crate) fn finish_resolved(
    state: &AppState,
    resolved: Result<IntentResult, OracleError>,
) -> DispatchOutcome {
    match state.fallback.decide(resolved) {
        Some(call) => dispatch(&state.registry, &state.todos, &call),
        None => DispatchOutcome::ok(None, ArgMap::new(), NO_INTENT_MESSAGE.to_string()),
    }
}

// ── HTTP plumbing ───────────────────────────────────────────────────────

pub(crate) fn split_url(url: &str) -> (&str, &str) {
    match url.split_once('?') {
        Some((path, query)) => (path, query),
        None => (url, ""),
    }
}

pub(crate) fn query_param(query: &str, name: &str) -> Option<String> {
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}

fn read_audio_part(request: &mut Request) -> Option<Vec<u8>> {
    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_string())?;
    let boundary = multipart_boundary(&content_type)?;
    let mut body = Vec::new();
    request.as_reader().read_to_end(&mut body).ok()?;
    multipart_field(&body, &boundary, "audio").map(|bytes| bytes.to_vec())
}

fn respond_json(request: Request, status: u16, body: &Value) {
    let mut response = Response::from_string(body.to_string()).with_status_code(status);
    if let Ok(header) = Header::from_bytes("Content-Type", "application/json; charset=utf-8") {
        response.add_header(header);
    }
    let _ = request.respond(response);
}

fn respond_html(request: Request, body: &str) {
    let mut response = Response::from_string(body);
    if let Ok(header) = Header::from_bytes("Content-Type", "text/html; charset=utf-8") {
        response.add_header(header);
    }
    let _ = request.respond(response);
}

// ── Multipart body parsing ──────────────────────────────────────────────
// The browser posts audio as multipart/form-data; only the named field's
// raw bytes are needed, so the body is parsed in place.

pub(crate) fn multipart_boundary(content_type: &str) -> Option<String> {
    let mut parts = content_type.split(';');
    let mime = parts.next()?.trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    for param in parts {
        let param = param.trim();
        if let Some(value) = param.strip_prefix("boundary=") {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Raw content of the multipart part whose form name matches `field`.
pub(crate) fn multipart_field<'a>(body: &'a [u8], boundary: &str, field: &str) -> Option<&'a [u8]> {
    let delim_owned = format!("--{boundary}");
    let delim = delim_owned.as_bytes();
    let mut rest = &body[find_subslice(body, delim)? + delim.len()..];
    loop {
        if rest.starts_with(b"--") {
            // Closing delimiter; the field was not in the body.
            return None;
        }
        let part = rest.strip_prefix(b"\r\n").unwrap_or(rest);
        let header_end = find_subslice(part, b"\r\n\r\n")?;
        let headers = &part[..header_end];
        let after_headers = &part[header_end + 4..];
        let next = find_subslice(after_headers, delim)?;
        let content = &after_headers[..next];
        let content = content.strip_suffix(b"\r\n").unwrap_or(content);
        if part_field_name(headers).as_deref() == Some(field) {
            return Some(content);
        }
        rest = &after_headers[next + delim.len()..];
    }
}

fn part_field_name(headers: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(headers);
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("content-disposition") {
            continue;
        }
        for param in value.split(';') {
            let param = param.trim();
            if let Some(name) = param.strip_prefix("name=") {
                return Some(name.trim_matches('"').to_string());
            }
        }
    }
    None
}

pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
