use crate::scheduler::DEFAULT_WORKER_COUNT;
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// `[scheduler]` section of the application config.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Worker pool size for the engine (`scheduler.thread_count`).
    pub thread_count: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            thread_count: DEFAULT_WORKER_COUNT,
        }
    }
}

/// Read the scheduler section, falling back to defaults when absent.
pub fn scheduler_settings(config: &Config) -> SchedulerSettings {
    config
        .get::<SchedulerSettings>("scheduler")
        .unwrap_or_default()
}

/// Load config from a specific TOML file, with `APP_`-prefixed
/// environment variables layered on top.
pub fn load_toml_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
        .add_source(config::Environment::with_prefix("APP").separator("_"))
        .build()
}

/// Load config from a specific YAML file.
pub fn load_yaml_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Yaml))
        .add_source(config::Environment::with_prefix("APP").separator("_"))
        .build()
}

/// Resolve a config placeholder like `${app.cron}` or
/// `${app.cron:0 * * * * *}`; anything else passes through unchanged.
pub fn resolve_config_value(value: &str, config: &Config) -> Result<String, ConfigError> {
    if value.starts_with("${") && value.ends_with('}') {
        let inner = &value[2..value.len() - 1];

        if let Some(colon_pos) = inner.find(':') {
            let key = &inner[..colon_pos];
            let default_value = &inner[colon_pos + 1..];
            match config.get_string(key) {
                Ok(resolved) => Ok(resolved),
                Err(_) => Ok(default_value.to_string()),
            }
        } else {
            config.get_string(inner)
        }
    } else {
        Ok(value.to_string())
    }
}
