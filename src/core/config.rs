//! Widget configuration: built-in defaults, `config.json`, and environment overrides.
//!
//! Built-in defaults are loaded from `config/defaults.json` (embedded at compile time and
//! validated by `build.rs`).

use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::core::paths;
use crate::core::pipeline::PipelineSettings;

/// Effective widget configuration. Serialized with camelCase keys, like the host-side
/// `setConfig` object.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub user_id: Option<String>,
    pub debug: bool,
    pub welcome_message: String,
    pub preview_len: usize,
    pub chart_id_prefix: String,
}

/// Partial configuration update. Absent fields leave the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub user_id: Option<String>,
    pub debug: Option<bool>,
    pub welcome_message: Option<String>,
    pub preview_len: Option<usize>,
    pub chart_id_prefix: Option<String>,
}

/// Error loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid JSON in config file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("API endpoint must start with http:// or https://, got '{0}'")]
    InvalidEndpoint(String),
    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Defaults {
    welcome_message: String,
    preview_len: usize,
    chart_id_prefix: String,
    debug: bool,
}

static DEFAULTS: OnceLock<Defaults> = OnceLock::new();

fn defaults() -> &'static Defaults {
    DEFAULTS.get_or_init(|| {
        let json = include_str!("../../config/defaults.json");
        serde_json::from_str(json).expect("defaults.json must be valid")
    })
}

impl Default for WidgetConfig {
    fn default() -> Self {
        let d = defaults();
        Self {
            api_endpoint: None,
            api_key: None,
            user_id: None,
            debug: d.debug,
            welcome_message: d.welcome_message.clone(),
            preview_len: d.preview_len,
            chart_id_prefix: d.chart_id_prefix.clone(),
        }
    }
}

impl std::fmt::Debug for WidgetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("user_id", &self.user_id)
            .field("debug", &self.debug)
            .field("welcome_message", &self.welcome_message)
            .field("preview_len", &self.preview_len)
            .field("chart_id_prefix", &self.chart_id_prefix)
            .finish()
    }
}

impl WidgetConfig {
    /// Apply a partial update on top of the current values.
    pub fn merge(&mut self, update: ConfigUpdate) {
        if let Some(v) = update.api_endpoint {
            self.api_endpoint = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = update.api_key {
            self.api_key = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = update.user_id {
            self.user_id = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = update.debug {
            self.debug = v;
        }
        if let Some(v) = update.welcome_message {
            self.welcome_message = v;
        }
        if let Some(v) = update.preview_len {
            self.preview_len = v;
        }
        if let Some(v) = update.chart_id_prefix {
            self.chart_id_prefix = v;
        }
        if self.debug {
            log::debug!("Config updated: {:?}", self);
        }
    }

    /// Check invariants the pipeline relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(endpoint) = &self.api_endpoint
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::InvalidEndpoint(endpoint.clone()));
        }
        if self.preview_len == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "previewLen",
                reason: "must be greater than zero".to_string(),
            });
        }
        // Chart ids end up in element ids and attribute values.
        if self.chart_id_prefix.is_empty()
            || !self
                .chart_id_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidSetting {
                name: "chartIdPrefix",
                reason: format!(
                    "must be non-empty and use only letters, digits, '-' and '_', got '{}'",
                    self.chart_id_prefix
                ),
            });
        }
        Ok(())
    }

    /// Settings consumed by the message content pipeline.
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            preview_len: self.preview_len,
            chart_id_prefix: self.chart_id_prefix.clone(),
        }
    }
}

/// Build a partial update from `GOALDIGGER_*` variables, read through `var`.
fn env_update(var: impl Fn(&str) -> Option<String>) -> ConfigUpdate {
    let debug = var("GOALDIGGER_DEBUG").map(|v| {
        let v = v.trim().to_ascii_lowercase();
        v == "1" || v == "true" || v == "yes"
    });
    ConfigUpdate {
        api_endpoint: var("GOALDIGGER_API_ENDPOINT"),
        api_key: var("GOALDIGGER_API_KEY"),
        user_id: var("GOALDIGGER_USER_ID"),
        debug,
        ..ConfigUpdate::default()
    }
}

/// Layer defaults, the optional config file, and environment variables, then validate.
pub fn load_with(
    file: Option<&Path>,
    var: impl Fn(&str) -> Option<String>,
) -> Result<WidgetConfig, ConfigError> {
    let mut config = WidgetConfig::default();
    if let Some(path) = file {
        match fs::read_to_string(path) {
            Ok(content) => {
                let update: ConfigUpdate = serde_json::from_str(&content)?;
                log::debug!("Loaded config file {}", path.display());
                config.merge(update);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    config.merge(env_update(var));
    config.validate()?;
    Ok(config)
}

/// Load configuration from the platform config directory and the environment.
pub fn load() -> Result<WidgetConfig, ConfigError> {
    let file = paths::config_file();
    load_with(file.as_deref(), |key| env::var(key).ok())
}
