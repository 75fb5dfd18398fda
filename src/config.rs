//! Configuration for the copilot server.
//!
//! Loaded from TOML; every section falls back to its defaults, so an empty
//! file is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CopilotError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CopilotConfig {
    /// HTTP / WebSocket listener.
    pub server: ServerConfig,
    /// Hosted language model.
    pub llm: LlmConfig,
    /// Turn detection and generation pacing.
    pub pacing: PacingConfig,
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8000`.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".into(),
        }
    }
}

/// Language model endpoint settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/v1/...`).
    pub api_url: String,
    pub model: String,
    /// Bearer token. Usually supplied by environment instead of the file.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// Token cap for question suggestions.
    pub max_tokens: usize,
    /// Token cap for the end-of-call summary.
    pub summary_max_tokens: usize,
    pub temperature: f64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.groq.com/openai".into(),
            model: "openai/gpt-oss-120b".into(),
            api_key: String::new(),
            max_tokens: 1024,
            summary_max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("max_tokens", &self.max_tokens)
            .field("summary_max_tokens", &self.summary_max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Pacing of turn detection and generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Quiet period after the last driving fragment that closes a turn.
    pub silence_threshold_ms: u64,
    /// Hard cap on a single suggestion round-trip. Zero fails immediately.
    pub generation_timeout_ms: u64,
    /// Cap on the end-of-call summary, including waiting for an in-flight
    /// suggestion to finish.
    pub summary_timeout_ms: u64,
    /// Number of most recent transcript entries sent with each request.
    pub transcript_window: usize,
    /// Prior generator exchanges replayed as chat history.
    pub max_history_exchanges: usize,
    /// Speakers whose speech is recorded but never drives a turn.
    pub observer_speakers: Vec<String>,
    /// Label used for the driving party in prompts.
    pub driving_label: String,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            silence_threshold_ms: 1500,
            generation_timeout_ms: 15_000,
            summary_timeout_ms: 60_000,
            transcript_window: 40,
            max_history_exchanges: 6,
            observer_speakers: vec!["recruiter".into()],
            driving_label: "hiring_manager".into(),
        }
    }
}

impl PacingConfig {
    pub fn silence_threshold(&self) -> Duration {
        Duration::from_millis(self.silence_threshold_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_millis(self.summary_timeout_ms)
    }

    /// Whether a fragment from `speaker` may drive a turn.
    ///
    /// Unlabelled speech counts as the driving party.
    pub fn is_driving(&self, speaker: Option<&str>) -> bool {
        match speaker {
            None => true,
            Some(s) => !self
                .observer_speakers
                .iter()
                .any(|o| o.eq_ignore_ascii_case(s.trim())),
        }
    }
}

impl CopilotConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CopilotError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CopilotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `<config dir>/recruiter-copilot/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("recruiter-copilot")
            .join("config.toml")
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply `COPILOT_API_KEY` (or `GROQ_API_KEY`) and `COPILOT_BIND`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("COPILOT_API_KEY").or_else(|| non_empty("GROQ_API_KEY")) {
            self.llm.api_key = key;
        }
        if let Some(bind) = non_empty("COPILOT_BIND") {
            self.server.bind = bind;
        }
    }

    /// Reject settings the session cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`CopilotError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(CopilotError::Config("llm.model must not be empty".into()));
        }
        if self.llm.api_url.trim().is_empty() {
            return Err(CopilotError::Config("llm.api_url must not be empty".into()));
        }
        if self.llm.max_tokens == 0 || self.llm.summary_max_tokens == 0 {
            return Err(CopilotError::Config("llm token limits must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(CopilotError::Config(format!(
                "llm.temperature {} is outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        if self.pacing.transcript_window == 0 {
            return Err(CopilotError::Config(
                "pacing.transcript_window must be at least 1".into(),
            ));
        }
        if self.pacing.driving_label.trim().is_empty() {
            return Err(CopilotError::Config(
                "pacing.driving_label must not be empty".into(),
            ));
        }
        Ok(())
    }
}
