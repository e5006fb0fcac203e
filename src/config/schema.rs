use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

// ── Top-level config ──────────────────────────────────────────────

/// Top-level tarpit configuration, loaded from `config.toml`.
///
/// Resolution order: `TARPIT_CONFIG_DIR` env → `~/.tarpit/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed at load time, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Pre-shared key required in the `x-api-key` header of every inbound
    /// message. Overridden by the `HONEYPOT_API_KEY` env var. The gateway
    /// refuses to start while this is empty.
    #[serde(default)]
    pub api_key: String,

    /// Reply-generator backend (`[llm]`).
    #[serde(default)]
    pub llm: LlmConfig,

    /// Session lifecycle settings (`[session]`).
    #[serde(default)]
    pub session: SessionConfig,

    /// Report trigger and delivery settings (`[report]`).
    #[serde(default)]
    pub report: ReportConfig,

    /// Gateway bind settings (`[gateway]`).
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            api_key: String::new(),
            llm: LlmConfig::default(),
            session: SessionConfig::default(),
            report: ReportConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

// ── LLM backend ──────────────────────────────────────────────────

/// Reply-generator configuration (`[llm]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key for the chat-completions backend. Overridden by `LLM_API_KEY`.
    /// Absent key → every reply falls back to the canned line.
    #[serde(default)]
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL. Overridden by `LLM_BASE_URL`.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model routed through the backend. Overridden by `LLM_MODEL`.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Sampling temperature. Slightly high: the persona improvises excuses.
    #[serde(default = "default_llm_temperature")]
    pub temperature: f64,
    /// Reply length cap; the persona speaks in 1-3 short sentences.
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_llm_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_llm_temperature() -> f64 {
    0.8
}

fn default_llm_max_tokens() -> u32 {
    150
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

// ── Sessions ─────────────────────────────────────────────────────

/// Session lifecycle configuration (`[session]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle seconds after which a session is reset on its next message.
    #[serde(default = "default_session_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum live sessions; the stalest is evicted beyond this.
    #[serde(default = "default_session_max_sessions")]
    pub max_sessions: usize,
}

fn default_session_timeout_secs() -> u64 {
    1800
}

fn default_session_max_sessions() -> usize {
    10_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_session_timeout_secs(),
            max_sessions: default_session_max_sessions(),
        }
    }
}

// ── Reporting ────────────────────────────────────────────────────

/// Report trigger and delivery configuration (`[report]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Collection endpoint for finished session reports.
    #[serde(default = "default_report_callback_url")]
    pub callback_url: String,
    /// History length (messages, both sides) required before reporting.
    #[serde(default = "default_report_message_threshold")]
    pub message_threshold: usize,
    /// Bounded depth of the delivery queue.
    #[serde(default = "default_report_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_report_callback_url() -> String {
    "https://hackathon.guvi.in/api/updateHoneyPotFinalResult".into()
}

fn default_report_message_threshold() -> usize {
    10
}

fn default_report_queue_capacity() -> usize {
    64
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            callback_url: default_report_callback_url(),
            message_threshold: default_report_message_threshold(),
            queue_capacity: default_report_queue_capacity(),
        }
    }
}

// ── Gateway ──────────────────────────────────────────────────────

/// Gateway bind configuration (`[gateway]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway host (default: 0.0.0.0; the decoy is meant to be reachable)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Gateway port (default: 8000). Overridden by `PORT`.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "0.0.0.0".into()
}

fn default_gateway_port() -> u16 {
    8000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

// ── Loading and overrides ────────────────────────────────────────

impl Config {
    /// Directory holding `config.toml`.
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = std::env::var("TARPIT_CONFIG_DIR") {
            let dir = dir.trim();
            if !dir.is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }

        let user_dirs = UserDirs::new().context("could not determine home directory")?;
        Ok(user_dirs.home_dir().join(".tarpit"))
    }

    /// Load the config file, writing a default one on first run.
    pub async fn load_or_init() -> Result<Self> {
        let path = Self::config_dir()?.join("config.toml");
        Self::load_or_init_at(&path).await
    }

    /// Same as [`Config::load_or_init`] against an explicit path.
    pub async fn load_or_init_at(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            let default = Self::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let rendered =
                toml::to_string_pretty(&default).context("failed to render default config")?;
            fs::write(path, rendered)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
        }

        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Config =
            toml::from_str(&raw).with_context(|| format!("invalid config at {}", path.display()))?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Persist the current configuration back to its file.
    pub async fn save(&self) -> Result<()> {
        let rendered = toml::to_string_pretty(self).context("failed to render config")?;
        fs::write(&self.config_path, rendered)
            .await
            .with_context(|| format!("failed to write {}", self.config_path.display()))?;
        Ok(())
    }

    /// Environment variables win over the file. Names kept stable for
    /// drop-in deployment next to existing tooling.
    pub fn apply_env_overrides(&mut self) {
        if let Some(value) = non_empty_env("HONEYPOT_API_KEY") {
            self.api_key = value;
        }
        if let Some(value) = non_empty_env("LLM_API_KEY") {
            self.llm.api_key = Some(value);
        }
        if let Some(value) = non_empty_env("LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = non_empty_env("LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = non_empty_env("PORT") {
            match value.parse::<u16>() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %value, "ignoring invalid PORT override"),
            }
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert!(config.api_key.is_empty());
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.session.timeout_secs, 1800);
        assert_eq!(config.session.max_sessions, 10_000);
        assert_eq!(config.report.message_threshold, 10);
        assert_eq!(config.gateway.port, 8000);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            api_key = "hp-secret"

            [session]
            timeout_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.api_key, "hp-secret");
        assert_eq!(config.session.timeout_secs, 60);
        assert_eq!(config.session.max_sessions, 10_000);
        assert_eq!(config.report.message_threshold, 10);
    }

    #[test]
    fn rendered_default_round_trips() {
        let rendered = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.llm.model, Config::default().llm.model);
    }

    #[tokio::test]
    async fn load_or_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_or_init_at(&path).await.unwrap();
        assert_eq!(config.config_path, path);
        assert!(path.exists());

        // Second load reads the file it just wrote.
        let reloaded = Config::load_or_init_at(&path).await.unwrap();
        assert_eq!(reloaded.gateway.port, config.gateway.port);
    }

    #[tokio::test]
    async fn save_round_trips_edits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::load_or_init_at(&path).await.unwrap();
        config.api_key = "hp-secret".to_string();
        config.save().await.unwrap();

        let reloaded = Config::load_or_init_at(&path).await.unwrap();
        assert_eq!(reloaded.api_key, "hp-secret");
    }
}
