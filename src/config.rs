// src/config.rs
//! Configuration loaded once at startup and passed to each pipeline stage

use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::app_log;
use crate::error::CustomizeError;

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
pub const MODEL_VAR: &str = "RESUME_CUSTOMIZER_MODEL";
pub const BASE_URL_VAR: &str = "RESUME_CUSTOMIZER_BASE_URL";
pub const RENDERER_VAR: &str = "RESUME_CUSTOMIZER_RENDERER";

pub const DEFAULT_MODEL: &str = "openai/gpt-5-mini";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_RENDERER: &str = "rendercv";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_CONFIG_FILE: &str = "resume-customizer.yaml";

#[derive(Debug, Clone)]
pub struct CustomizerConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub renderer: String,
    pub keep_intermediate: bool,
    pub intermediate_path: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for CustomizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            renderer: DEFAULT_RENDERER.to_string(),
            keep_intermediate: false,
            intermediate_path: None,
            verbose: false,
        }
    }
}

impl CustomizerConfig {
    /// The API key, or `AuthError` when it is absent or blank.
    pub fn require_api_key(&self) -> Result<&str, CustomizeError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(CustomizeError::Auth(format!(
                "OpenRouter API key not found. {API_KEY_VAR} is not set."
            ))),
        }
    }

    /// Whether the intermediate YAML outlives a successful render.
    pub fn retains_intermediate(&self) -> bool {
        self.keep_intermediate || self.intermediate_path.is_some()
    }
}

/// Optional YAML configuration file. The API key only comes from the environment.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    model: Option<String>,
    base_url: Option<String>,
    temperature: Option<f32>,
    renderer: Option<String>,
    keep_intermediate: Option<bool>,
}

/// Values coming from the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub keep_intermediate: bool,
    pub intermediate_path: Option<PathBuf>,
    pub verbose: bool,
}

pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration: defaults, then config file, then environment, then CLI overrides
    pub fn load(
        config_file: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<CustomizerConfig, CustomizeError> {
        Self::load_with(config_file, overrides, |name| std::env::var(name).ok())
    }

    /// Same as [`ConfigManager::load`] with an injectable environment lookup.
    pub fn load_with<F>(
        config_file: Option<&Path>,
        overrides: ConfigOverrides,
        env: F,
    ) -> Result<CustomizerConfig, CustomizeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CustomizerConfig::default();

        if let Some(file) = Self::load_file(config_file)? {
            Self::apply_file(&mut config, file)?;
        }

        config.api_key = env(API_KEY_VAR).filter(|key| !key.trim().is_empty());
        if let Some(model) = env(MODEL_VAR) {
            config.model = model;
        }
        if let Some(base_url) = env(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        if let Some(renderer) = env(RENDERER_VAR) {
            config.renderer = renderer;
        }

        if let Some(model) = overrides.model {
            config.model = model;
        }
        config.keep_intermediate |= overrides.keep_intermediate;
        config.intermediate_path = overrides.intermediate_path;
        config.verbose = overrides.verbose;

        app_log!(
            info,
            "Configuration loaded: model={}, base_url={}, renderer={}",
            config.model, config.base_url, config.renderer
        );
        Ok(config)
    }

    /// An explicit path must exist; the default file in the working directory is optional.
    fn load_file(path: Option<&Path>) -> Result<Option<ConfigFile>, CustomizeError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default_path.exists() {
                    return Ok(None);
                }
                default_path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))
            .map_err(CustomizeError::Config)?;

        if content.trim().is_empty() {
            return Ok(Some(ConfigFile::default()));
        }

        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
            .map_err(CustomizeError::Config)?;

        app_log!(info, "Loaded configuration file: {}", path.display());
        Ok(Some(file))
    }

    fn apply_file(config: &mut CustomizerConfig, file: ConfigFile) -> Result<(), CustomizeError> {
        if let Some(model) = file.model {
            config.model = model;
        }
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(temperature) = file.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(CustomizeError::Config(anyhow::anyhow!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                )));
            }
            config.temperature = temperature;
        }
        if let Some(renderer) = file.renderer {
            config.renderer = renderer;
        }
        if let Some(keep) = file.keep_intermediate {
            config.keep_intermediate = keep;
        }
        Ok(())
    }
}
