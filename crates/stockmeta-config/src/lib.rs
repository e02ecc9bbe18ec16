use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockmeta_types::json::balanced_objects;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config directory not found")]
    NoDirFound,
}

/// Vision/text generation provider (OpenAI-compatible chat completions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the chat completions API.
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,
    /// Model used when an image sample is attached.
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// Model used for text-only prompts (translation).
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_vision_timeout")]
    pub vision_timeout_secs: u64,
    #[serde(default = "default_text_timeout")]
    pub text_timeout_secs: u64,
}

fn default_provider_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_vision_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}

fn default_text_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_vision_timeout() -> u64 {
    60
}

fn default_text_timeout() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_base_url(),
            vision_model: default_vision_model(),
            text_model: default_text_model(),
            vision_timeout_secs: default_vision_timeout(),
            text_timeout_secs: default_text_timeout(),
        }
    }
}

/// Third-party keyword-scoring service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordServiceConfig {
    #[serde(default = "default_keyword_base_url")]
    pub base_url: String,
    /// Number of keywords requested per call.
    #[serde(default = "default_num_keywords")]
    pub num_keywords: usize,
    /// Minimum relevance score kept by the service.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_text_timeout")]
    pub timeout_secs: u64,
}

fn default_keyword_base_url() -> String {
    "https://api.everypixel.com/v1".to_string()
}

fn default_num_keywords() -> usize {
    50
}

fn default_threshold() -> f64 {
    0.2
}

impl Default for KeywordServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_keyword_base_url(),
            num_keywords: default_num_keywords(),
            threshold: default_threshold(),
            timeout_secs: default_text_timeout(),
        }
    }
}

/// User settings. Read-only for the duration of a generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Primary vision/text provider key.
    #[serde(default)]
    pub groq_api_key: String,
    /// Keyword-scoring client id (optional).
    #[serde(default)]
    pub everypixel_id: String,
    /// Keyword-scoring client secret (optional).
    #[serde(default)]
    pub everypixel_secret: String,
    /// Last folder worked on; default location of the CSV export.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub keyword_service: KeywordServiceConfig,
    /// Parallel thumbnail decodes.
    #[serde(default = "default_thumbnail_concurrency")]
    pub thumbnail_concurrency: usize,
}

fn default_thumbnail_concurrency() -> usize {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            everypixel_id: String::new(),
            everypixel_secret: String::new(),
            save_dir: None,
            provider: ProviderConfig::default(),
            keyword_service: KeywordServiceConfig::default(),
            thumbnail_concurrency: default_thumbnail_concurrency(),
        }
    }
}

impl Settings {
    /// Both keyword-scoring credentials are present.
    pub fn has_keyword_service(&self) -> bool {
        !self.everypixel_id.trim().is_empty() && !self.everypixel_secret.trim().is_empty()
    }

    pub fn has_api_key(&self) -> bool {
        !self.groq_api_key.trim().is_empty()
    }

    /// Override credentials from the environment (`GROQ_API_KEY`,
    /// `EVERYPIXEL_CLIENT_ID`, `EVERYPIXEL_CLIENT_SECRET`).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("GROQ_API_KEY") {
            self.groq_api_key = key;
        }
        if let Some(id) = non_empty("EVERYPIXEL_CLIENT_ID") {
            self.everypixel_id = id;
        }
        if let Some(secret) = non_empty("EVERYPIXEL_CLIENT_SECRET") {
            self.everypixel_secret = secret;
        }
    }

    /// Parse a settings blob, tolerating trailing garbage.
    ///
    /// Falls back to defaults when nothing in the text parses.
    pub fn parse_lenient(content: &str) -> Self {
        if let Ok(settings) = json5::from_str::<Settings>(content) {
            return settings;
        }
        for candidate in balanced_objects(content) {
            if let Ok(settings) = json5::from_str::<Settings>(candidate) {
                return settings;
            }
        }
        tracing::warn!("Settings could not be parsed, using defaults");
        Settings::default()
    }
}

/// Resolve the stockmeta config directory (~/.stockmeta/).
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|h| h.join(".stockmeta"))
        .ok_or(ConfigError::NoDirFound)
}

/// Resolve the settings file path (~/.stockmeta/settings.json5).
pub fn settings_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("settings.json5"))
}

/// Resolve the state database path (~/.stockmeta/state.db).
pub fn state_db_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("state.db"))
}

/// Resolve the thumbnail cache directory (~/.stockmeta/thumbs/).
pub fn thumbnail_dir() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("thumbs"))
}

/// Load settings from the default path, then apply `.env` and environment overrides.
pub fn load_settings() -> Result<Settings, ConfigError> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let path = settings_file_path()?;
    let mut settings = load_settings_from(&path)?;
    settings.apply_env(|name| std::env::var(name).ok());
    Ok(settings)
}

/// Load settings from a specific path, falling back to defaults if not found.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        tracing::debug!("Settings file not found at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)?;
    Ok(Settings::parse_lenient(&content))
}

/// Ensure the config directory exists.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let dir = config_dir()?;
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// Save settings to the default path.
pub fn save_settings(settings: &Settings) -> Result<(), ConfigError> {
    let dir = ensure_config_dir()?;
    save_settings_to(&dir.join("settings.json5"), settings)
}

/// Save settings to a specific path.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}
