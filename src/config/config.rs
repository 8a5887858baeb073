use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::interceptor::InterceptorConfig;
use super::logging::LoggingConfig;
use crate::error::Error;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "AUTHFETCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default)]
    pub interceptor: InterceptorConfig,
    #[serde(default)]
    pub threads: ThreadsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the thread list lives, relative to the application origin.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct ThreadsConfig {
    pub path: String,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            path: "/api/threads".to_string(),
        }
    }
}

/// Builds the figment: the YAML file first, then `AUTHFETCH_*` overrides
/// (nested keys separated by `__`, e.g. `AUTHFETCH_INTERCEPTOR__LOGIN_PATH`).
pub fn build_figment(path: &str) -> Figment {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed("AUTHFETCH_").ignore(&["config"]).split("__"))
}

/// Extracts and validates a v1 config from an already assembled figment.
pub fn extract_config(figment: Figment) -> Result<ConfigV1, Error> {
    let config = figment
        .extract::<Config>()
        .map_err(|e| Error::Config(e.to_string()))?;
    let config = match config {
        Config::ConfigV1(c) => c,
    };
    config.interceptor.validate()?;
    Ok(config)
}

/// Load config from `$AUTHFETCH_CONFIG`, or "config.yaml" in the current directory.
pub fn load_config() -> Result<ConfigV1, Error> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    extract_config(build_figment(&path))
}

/// Render the JSON schema for the configuration.
pub fn config_schema() -> Result<String, Error> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema).map_err(|e| Error::Config(e.to_string()))
}
