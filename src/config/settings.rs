use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Environment variable naming the YAML settings file.
pub const SETTINGS_FILE_ENV: &str = "AEROSTACK_SETTINGS_FILE";
/// Fallback environment variable for the API server url.
pub const SERVER_URL_ENV: &str = "AEROSTACK_SERVER_URL";

/// ================================
/// Process-wide SDK settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub server_url: Option<String>,
    pub auth_url: Option<String>,
    pub api_username: Option<String>,
    pub api_password: Option<String>,
    pub api_member_id: Option<u64>,
    pub logging: Option<LoggingConfig>,
    /// Values not covered by the typed fields, reachable through `get`.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Settings {
    /// Load settings from the file named by `AEROSTACK_SETTINGS_FILE`.
    /// Fails when the variable is unset or empty.
    pub fn load() -> Result<Self> {
        let path = env::var(SETTINGS_FILE_ENV).unwrap_or_default();
        if path.is_empty() {
            bail!(
                "the {} environment variable must name a settings file",
                SETTINGS_FILE_ENV
            );
        }
        Self::from_file(&path)
    }

    /// Load and parse a YAML settings file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path).with_context(|| {
            format!("failed to read settings file {}", path.as_ref().display())
        })?;
        let settings: Settings = serde_yaml::from_str(&raw).with_context(|| {
            format!("failed to parse settings file {}", path.as_ref().display())
        })?;
        Ok(settings)
    }

    /// Named-value lookup over typed fields and extras.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "server_url" => self.server_url.clone(),
            "auth_url" => self.auth_url.clone(),
            "api_username" => self.api_username.clone(),
            "api_password" => self.api_password.clone(),
            "api_member_id" => self.api_member_id.map(|id| id.to_string()),
            _ => self.extra.get(key).and_then(scalar_to_string),
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Process-wide settings, loaded on first successful access and cached for
/// the process lifetime. A failed load is returned to the caller and nothing
/// is cached, so a later access may still succeed.
pub fn settings() -> Result<&'static Settings> {
    if let Some(cached) = SETTINGS.get() {
        return Ok(cached);
    }
    let loaded = Settings::load()?;
    Ok(SETTINGS.get_or_init(|| loaded))
}

/// Resolve the default server url: the settings value wins, then the
/// `AEROSTACK_SERVER_URL` environment variable. Trailing slashes are stripped.
pub fn default_server_url() -> Result<String> {
    let configured = settings().ok().and_then(|s| s.server_url.clone());
    let url = match configured {
        Some(url) => url,
        None => env::var(SERVER_URL_ENV).unwrap_or_default(),
    };
    if url.is_empty() {
        bail!(
            "no server url configured: set server_url in the settings file or the {} environment variable",
            SERVER_URL_ENV
        );
    }
    Ok(url.trim_end_matches('/').to_string())
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "json".to_string())
            .to_lowercase()
            .as_str()
        {
            "compact" | "text" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}
