use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::engine::types::{DensityPolicy, SentenceSplit};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarginaliaConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub generator: GeneratorConfig,
    pub personas: PersonasConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `stdio` or `http` (streamable HTTP).
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    pub max_attempts: usize,
    pub attempt_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub min_text_length: usize,
    pub min_text_change: usize,
    pub density_policy: DensityPolicy,
    pub sentence_split: SentenceSplit,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PersonasConfig {
    /// Optional TOML catalog replacing the built-in voices.
    pub path: Option<String>,
}

impl Default for MarginaliaConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            engine: EngineConfig::default(),
            generator: GeneratorConfig::default(),
            personas: PersonasConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 7431,
            log_level: "info".into(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_secs: 30,
            session_ttl_secs: 3600,
            min_text_length: 20,
            min_text_change: 0,
            density_policy: DensityPolicy::default(),
            sentence_split: SentenceSplit::default(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            endpoint: "https://api.deepseek.com/v1".into(),
            model: "deepseek-chat".into(),
            api_key_env: "MARGINALIA_API_KEY".into(),
            max_tokens: 600,
            temperature: 0.7,
        }
    }
}

impl EngineConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Returns `~/.marginalia/`
pub fn default_marginalia_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marginalia")
}

/// Returns the default config file path: `~/.marginalia/config.toml`
pub fn default_config_path() -> PathBuf {
    default_marginalia_dir().join("config.toml")
}

impl MarginaliaConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            MarginaliaConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (MARGINALIA_TRANSPORT, MARGINALIA_LOG_LEVEL,
    /// MARGINALIA_ENDPOINT, MARGINALIA_MODEL, MARGINALIA_DENSITY_POLICY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MARGINALIA_TRANSPORT") {
            self.server.transport = val;
        }
        if let Ok(val) = std::env::var("MARGINALIA_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("MARGINALIA_ENDPOINT") {
            self.generator.endpoint = val;
        }
        if let Ok(val) = std::env::var("MARGINALIA_MODEL") {
            self.generator.model = val;
        }
        if let Ok(val) = std::env::var("MARGINALIA_DENSITY_POLICY") {
            match val.parse() {
                Ok(policy) => self.engine.density_policy = policy,
                Err(e) => warn!(value = %val, "ignoring MARGINALIA_DENSITY_POLICY: {e}"),
            }
        }
    }

    /// Resolve the persona catalog path, expanding `~` if needed.
    pub fn resolved_personas_path(&self) -> Option<PathBuf> {
        self.personas.path.as_deref().map(expand_tilde)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
