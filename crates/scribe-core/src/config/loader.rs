//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Global config (~/.scribe/config.yaml)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables (`SCRIBE_*`, `OPENAI_API_KEY`, `PORT`)
//! 5. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{RetryOn, RuntimeConfig};
use camino::{Utf8Path, Utf8PathBuf};
use serde_yaml_ng::Value;
use std::env;
use std::fs;

const GLOBAL_CONFIG_FILE: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct ConfigLoader {
    /// Directory holding the global config file
    config_dir: Utf8PathBuf,
}

impl ConfigLoader {
    /// Create a loader rooted at `~/.scribe`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|_| Error::invalid_config("Home directory is not valid UTF-8"))?;
        Ok(Self {
            config_dir: home.join(".scribe"),
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    /// Load runtime configuration with hierarchical precedence
    ///
    /// `explicit` must exist when given; the global file is optional.
    pub fn load(&self, explicit: Option<&Utf8Path>) -> Result<RuntimeConfig> {
        let mut merged = serde_yaml_ng::to_value(RuntimeConfig::default())?;

        let global_path = self.config_dir.join(GLOBAL_CONFIG_FILE);
        if global_path.exists() {
            tracing::debug!(path = %global_path, "loading global config");
            Self::merge_file(&mut merged, &global_path)?;
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::config_not_found(path.as_str()));
            }
            tracing::debug!(path = %path, "loading config file");
            Self::merge_file(&mut merged, path)?;
        }

        let config: RuntimeConfig = serde_yaml_ng::from_value(merged)
            .map_err(|e| Error::invalid_config(format!("Failed to apply config: {}", e)))?;
        let config = Self::apply_env_overrides(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer a YAML file over `merged`; an empty document changes nothing
    fn merge_file(merged: &mut Value, path: &Utf8Path) -> Result<()> {
        let overlay = Self::load_yaml_file(path)?;
        if !overlay.is_null() {
            merge_yaml(merged, overlay);
        }
        Ok(())
    }

    /// Load a YAML file as an untyped tree
    fn load_yaml_file(path: &Utf8Path) -> Result<Value> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(value)
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Some(key) = env_value("OPENAI_API_KEY").or_else(|| env_value("REACT_APP_OPENAI_API_KEY"))
        {
            config.openai.api_key = Some(key);
        }

        if let Some(val) = env_value("SCRIBE_OPENAI_BASE_URL") {
            config.openai.base_url = val.trim_end_matches('/').to_string();
        }

        if let Some(val) = env_value("SCRIBE_TRANSCRIPTION_MODEL") {
            config.openai.transcription_model = val;
        }

        if let Some(val) = env_value("SCRIBE_CHAT_MODEL") {
            config.openai.chat_model = val;
        }

        if let Some(val) = env_value("SCRIBE_RETRY_ON") {
            config.openai.retry_on = parse_retry_on(&val)?;
        }

        // Network
        if let Some(val) = env_value("SCRIBE_ATTEMPT_TIMEOUT_SECS") {
            config.network.attempt_timeout_secs = parse_number("SCRIBE_ATTEMPT_TIMEOUT_SECS", &val)?;
        }

        if let Some(val) = env_value("SCRIBE_REQUEST_DEADLINE_SECS") {
            config.network.request_deadline_secs =
                Some(parse_number("SCRIBE_REQUEST_DEADLINE_SECS", &val)?);
        }

        // Server
        if let Some(val) = env_value("SCRIBE_HOST") {
            config.server.host = val;
        }

        if let Some((key, val)) = ["SCRIBE_PORT", "PORT"]
            .into_iter()
            .find_map(|key| env_value(key).map(|val| (key, val)))
        {
            config.server.port = parse_number(key, &val)?;
        }

        // Retry budget applies to every policy
        if let Some(val) = env_value("SCRIBE_RETRY_MAX_ATTEMPTS") {
            let max_attempts = parse_number("SCRIBE_RETRY_MAX_ATTEMPTS", &val)?;
            config.retry_policies.default.max_attempts = max_attempts;
            for policy in config.retry_policies.operations.values_mut() {
                policy.max_attempts = max_attempts;
            }
        }

        if let Some(val) = env_value("SCRIBE_RETRY_BASE_DELAY_MS") {
            let delay = parse_number("SCRIBE_RETRY_BASE_DELAY_MS", &val)?;
            config.retry_policies.default.initial_delay_ms = delay;
            for policy in config.retry_policies.operations.values_mut() {
                policy.initial_delay_ms = delay;
            }
        }

        Ok(config)
    }
}

/// Recursively overlay `overlay` onto `base`; mappings merge, everything else replaces
fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        // Nested nulls clear optional keys
        (base, overlay) => *base = overlay,
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::invalid_config(format!("{} must be a valid number, got {}", key, value)))
}

fn parse_retry_on(value: &str) -> Result<RetryOn> {
    match value.to_ascii_lowercase().as_str() {
        "rate-limit" | "rate_limit" | "429" => Ok(RetryOn::RateLimit),
        "transient" => Ok(RetryOn::Transient),
        "any" | "all" => Ok(RetryOn::Any),
        other => Err(Error::invalid_config(format!(
            "SCRIBE_RETRY_ON must be one of rate-limit, transient, any; got {}",
            other
        ))),
    }
}
