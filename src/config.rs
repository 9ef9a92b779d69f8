use std::env;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crate::{FallbackMode, GateMode};

pub(crate) const DEFAULT_PORT: u16 = 5000;
pub(crate) const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub(crate) const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub(crate) const DEFAULT_VERIFY_THRESHOLD: f64 = 0.7;
/// Browser recordings arrive as MediaRecorder webm.
pub(crate) const AUDIO_MIME: &str = "audio/webm";

pub(crate) fn env_required(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    let value = env::var(name).unwrap_or_default();
    if value.trim().is_empty() {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("Missing {name}")).into());
    }
    Ok(value)
}

pub(crate) fn env_optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub(crate) fn env_u64(name: &str, default: u64) -> Result<u64, Box<dyn std::error::Error>> {
    match env_optional(name) {
        Some(value) => Ok(value
            .parse::<u64>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid {name}")))?),
        None => Ok(default),
    }
}

pub(crate) fn env_f64(name: &str, default: f64) -> Result<f64, Box<dyn std::error::Error>> {
    match env_optional(name) {
        Some(value) => Ok(value
            .parse::<f64>()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid {name}")))?),
        None => Ok(default),
    }
}

/// Credentials and limits for the external Intent Oracle.
#[derive(Debug, Clone)]
pub(crate) struct OracleConfig {
    pub(crate) api_key: String,
    pub(crate) model: String,
    pub(crate) base_url: String,
    /// Bounds every outbound round trip; a timeout degrades to the
    /// fallback path, it is never retried.
    pub(crate) timeout: Duration,
}

impl OracleConfig {
    pub(crate) fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let api_key = env_required("GEMINI_API_KEY")?;
        let model = env_optional("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url =
            env_optional("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = Duration::from_secs(env_u64("GEMINI_TIMEOUT", 30)?);
        Ok(Self {
            api_key,
            model,
            base_url,
            timeout,
        })
    }
}

/// Everything the HTTP listener needs, resolved from CLI flags and env.
/// CLI flags win over env; env wins over defaults.
#[derive(Debug, Clone)]
pub(crate) struct ServeConfig {
    pub(crate) bind: String,
    pub(crate) port: u16,
    pub(crate) voiceprint_dir: PathBuf,
    pub(crate) log_dir: PathBuf,
    pub(crate) gate_mode: GateMode,
    pub(crate) fallback_mode: FallbackMode,
    pub(crate) verify_threshold: f64,
}

impl ServeConfig {
    pub(crate) fn resolve(
        bind: String,
        port: Option<u16>,
        voiceprint_dir: PathBuf,
        log_dir: PathBuf,
        gate_mode: Option<String>,
        fallback_mode: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let port = match port {
            Some(p) => p,
            None => env_u64("PORT", DEFAULT_PORT as u64)? as u16,
        };
        let gate_mode = gate_mode
            .or_else(|| env_optional("VOXGATE_GATE_MODE"))
            .map(|v| GateMode::parse(&v))
            .transpose()?
            .unwrap_or(GateMode::Strict);
        let fallback_mode = fallback_mode
            .or_else(|| env_optional("VOXGATE_FALLBACK_MODE"))
            .map(|v| FallbackMode::parse(&v))
            .transpose()?
            .unwrap_or(FallbackMode::Passive);
        let verify_threshold = env_f64("VOXGATE_VERIFY_THRESHOLD", DEFAULT_VERIFY_THRESHOLD)?;
        Ok(Self {
            bind,
            port,
            voiceprint_dir,
            log_dir,
            gate_mode,
            fallback_mode,
            verify_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_defaults_fail_closed_and_passive() {
        let cfg = ServeConfig::resolve(
            "127.0.0.1".to_string(),
            Some(8080),
            PathBuf::from("vp"),
            PathBuf::from("logs"),
            None,
            None,
        )
        .unwrap();
        assert_eq!(cfg.gate_mode, GateMode::Strict);
        assert_eq!(cfg.fallback_mode, FallbackMode::Passive);
        assert_eq!(cfg.port, 8080);
        assert!((cfg.verify_threshold - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn resolve_cli_mode_overrides() {
        let cfg = ServeConfig::resolve(
            "127.0.0.1".to_string(),
            Some(8080),
            PathBuf::from("vp"),
            PathBuf::from("logs"),
            Some("demo".to_string()),
            Some("canned-email".to_string()),
        )
        .unwrap();
        assert_eq!(cfg.gate_mode, GateMode::Demo);
        assert_eq!(cfg.fallback_mode, FallbackMode::CannedEmail);
    }

    #[test]
    fn resolve_rejects_bad_mode() {
        let err = ServeConfig::resolve(
            "127.0.0.1".to_string(),
            Some(8080),
            PathBuf::from("vp"),
            PathBuf::from("logs"),
            Some("everyone".to_string()),
            None,
        );
        assert!(err.is_err());
    }
}
