use std::path::{Path, PathBuf};

use eyre::Result;
use log::debug;
use serde::Deserialize;

use crate::summarize::{ANTHROPIC_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, ModelSettings, OPENAI_BASE_URL};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind: String,
    /// First transcript language attempted
    pub preferred_lang: String,
    /// Second transcript language attempted before any available track
    pub fallback_lang: String,
    pub model: String,
    pub temperature: f32,
    /// Re-prompts allowed when the model reply is not valid JSON
    pub repair_attempts: u32,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            preferred_lang: "ko".to_string(),
            fallback_lang: "en".to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            repair_attempts: 0,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            anthropic_base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }
}

impl Config {
    /// Load config from `path`, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            repair_attempts: self.repair_attempts,
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("shortsmith")
        .join("config.toml")
}
