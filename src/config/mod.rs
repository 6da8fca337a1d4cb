use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::llm::gemini::DEFAULT_ENDPOINT;
use crate::prompts::PromptConfig;

pub const APP_DIR_NAME: &str = "teachermind";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Models offered in the settings view, recommended first.
pub const SUPPORTED_MODELS: &[(&str, &str)] = &[
    ("gemini-2.5-flash", "Gemini 2.5 Flash (Recommended)"),
    ("gemini-1.5-pro", "Gemini 1.5 Pro"),
    ("gemini-1.5-flash", "Gemini 1.5 Flash"),
];

/// Credential baked in at build time, used only when the user has not saved one.
const BUILD_TIME_API_KEY: Option<&str> = option_env!("GEMINI_API_KEY");

/// The user-editable settings record, persisted under `tm_settings`.
#[derive(Debug, Deserialize, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
        }
    }
}

impl AppSettings {
    /// The stored key, or the build-time default when none was saved.
    pub fn effective_api_key(&self) -> Option<&str> {
        let stored = self.api_key.trim();
        if !stored.is_empty() {
            return Some(stored);
        }
        BUILD_TIME_API_KEY.map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn effective_model(&self) -> &str {
        let model = self.model.trim();
        if model.is_empty() {
            DEFAULT_MODEL
        } else {
            model
        }
    }

    pub fn masked_api_key(&self) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            "(not set)".to_string()
        } else if key.chars().count() > 6 {
            let head: String = key.chars().take(3).collect();
            let tail: String = key.chars().skip(key.chars().count() - 3).collect();
            format!("{}...{}", head, tail)
        } else {
            "***".to_string()
        }
    }
}

/// Process configuration: where state lives and which endpoint to talk to.
/// Read from `config.toml` and `TEACHERMIND_*` environment variables.
#[derive(Debug, Deserialize, Clone, Serialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub prompts: PromptConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn default_export_dir() -> PathBuf {
    dirs::document_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| default_data_dir().join("exports"))
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: default_export_dir(),
            endpoint: default_endpoint(),
            prompts: PromptConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    pub fn config_file_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from `path` (or the default location). A missing file is not an
    /// error; every field has a default.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::config_file_path);

        let config = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("TEACHERMIND"))
            .build()?;

        config.try_deserialize()
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }
}
