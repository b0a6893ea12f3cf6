//! Configuration management for the detection service
//!
//! Values are layered: built-in defaults, then `config/config.toml` if present,
//! then environment variables (`PORT`, `DEBUG`, `MODEL_PATH`, `MODEL_URL`, ...).
//! Configuration is read once at startup.

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_MODEL_PATH: &str = "fraud_pipeline.onnx";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_METRICS_INTERVAL_SECS: u64 = 60;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Interface to bind
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Verbose logging. Only a case-insensitive `true` turns it on.
    #[serde(deserialize_with = "deserialize_debug_flag")]
    pub debug: bool,
    /// Local path of the model artifact
    pub model_path: String,
    /// Remote source fetched when the artifact is absent
    #[serde(default)]
    pub model_url: Option<String>,
    /// Directory served under `/static`
    pub static_dir: String,
    /// Number of threads for ONNX inference
    pub onnx_threads: usize,
    /// Seconds between metrics summaries, 0 disables them
    pub metrics_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from the default file and the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH, None)
    }

    /// Load configuration from a specific path. `env` replaces the process
    /// environment when given.
    pub fn load_from<P: AsRef<Path>>(path: P, env: Option<HashMap<String, String>>) -> Result<Self> {
        let config = Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("debug", false)?
            .set_default("model_path", DEFAULT_MODEL_PATH)?
            .set_default("static_dir", DEFAULT_STATIC_DIR)?
            .set_default("onnx_threads", 1)?
            .set_default("metrics_interval_secs", DEFAULT_METRICS_INTERVAL_SECS as i64)?
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(Environment::default().try_parsing(true).source(env))
            .build()
            .context("Failed to build configuration")?;

        let mut config: Self = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.model_url = config
            .model_url
            .take()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(config)
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Raw `DEBUG` value as it arrives from a file or the environment
#[derive(Deserialize)]
#[serde(untagged)]
enum DebugFlag {
    Bool(bool),
    Text(String),
    Other(IgnoredAny),
}

/// Anything other than `true` (in any case) means off, including `1`, `yes`
/// and unparseable values.
fn deserialize_debug_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match DebugFlag::deserialize(deserializer)? {
        DebugFlag::Bool(enabled) => enabled,
        DebugFlag::Text(text) => text.trim().eq_ignore_ascii_case("true"),
        DebugFlag::Other(_) => false,
    })
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            model_url: None,
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            onnx_threads: 1,
            metrics_interval_secs: DEFAULT_METRICS_INTERVAL_SECS,
        }
    }
}
