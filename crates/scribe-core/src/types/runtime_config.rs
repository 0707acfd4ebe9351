//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior: upstream
//! OpenAI settings, network timeouts, the proxy server, and retry policies.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Operation name used for audio transcription calls
pub const OP_TRANSCRIPTION: &str = "transcription";
/// Operation name used for chat-completion calls
pub const OP_CHAT_COMPLETION: &str = "chat-completion";
/// Operation name used for model listing calls
pub const OP_LIST_MODELS: &str = "list-models";

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Upstream OpenAI settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Proxy server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Retry policy configurations
    #[serde(default)]
    pub retry_policies: RetryPoliciesConfig,
}

impl RuntimeConfig {
    /// Validate every section that has constraints
    pub fn validate(&self) -> Result<()> {
        self.retry_policies.validate()?;
        self.network.validate()?;
        if self.server.max_upload_bytes == 0 {
            return Err(Error::invalid_config(
                "server.max-upload-bytes must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Upstream OpenAI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpenAiConfig {
    /// API key; normally supplied through `OPENAI_API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the API, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for audio transcription
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,

    /// Model used for summaries
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Completion token limit for summaries
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature for summaries
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Which upstream failures are worth another attempt
    #[serde(default)]
    pub retry_on: RetryOn,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            transcription_model: default_transcription_model(),
            chat_model: default_chat_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            retry_on: RetryOn::default(),
        }
    }
}

impl OpenAiConfig {
    /// Key with everything past the first few characters hidden
    pub fn masked_api_key(&self) -> Option<String> {
        self.api_key.as_deref().map(|key| {
            let prefix: String = key.chars().take(7).collect();
            format!("{}…", prefix)
        })
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_transcription_model() -> String {
    "whisper-1".to_string()
}
fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_temperature() -> f32 {
    0.3
}

/// Classification of upstream failures that should be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryOn {
    /// Only rate-limit responses (HTTP 429)
    #[default]
    RateLimit,

    /// Rate limits, timeouts, server errors and transport failures
    Transient,

    /// Every failure
    Any,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for a single upstream HTTP attempt, in seconds
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_secs: u64,

    /// Deadline for a whole retried operation, in seconds. `None` disables it.
    #[serde(default = "default_request_deadline")]
    pub request_deadline_secs: Option<u64>,

    /// User agent string for upstream requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_secs: default_attempt_timeout(),
            request_deadline_secs: default_request_deadline(),
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if self.attempt_timeout_secs == 0 {
            return Err(Error::invalid_config(
                "network.attempt-timeout-secs must be greater than 0",
            ));
        }
        if self.request_deadline_secs == Some(0) {
            return Err(Error::invalid_config(
                "network.request-deadline-secs must be greater than 0",
            ));
        }
        Ok(())
    }
}

fn default_attempt_timeout() -> u64 {
    120
}
fn default_request_deadline() -> Option<u64> {
    Some(300) // 5 minutes
}
fn default_user_agent() -> String {
    format!(
        "scribe/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Proxy server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body (audio uploads)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024 // 25 MB
}

/// Retry policy configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Default retry policy
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();

        // Upstream calls back off from 2s and spread out concurrent clients
        let upstream = RetryPolicy {
            initial_delay_ms: 2000,
            jitter: true,
            ..RetryPolicy::default()
        };
        operations.insert(OP_TRANSCRIPTION.to_string(), upstream.clone());
        operations.insert(OP_CHAT_COMPLETION.to_string(), upstream);

        Self {
            default: RetryPolicy::default(),
            operations,
        }
    }
}

impl RetryPoliciesConfig {
    /// Policy for a named operation, falling back to the default
    pub fn for_operation(&self, operation: &str) -> &RetryPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }

    fn validate(&self) -> Result<()> {
        self.default
            .validate()
            .map_err(|e| Error::invalid_config(format!("retry-policies.default: {}", e)))?;
        for (name, policy) in &self.operations {
            policy.validate().map_err(|e| {
                Error::invalid_config(format!("retry-policies.operations.{}: {}", name, e))
            })?;
        }
        Ok(())
    }
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Retry strategy
    #[serde(default)]
    pub strategy: RetryStrategy,

    /// Backoff multiplier for exponential strategies
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Base delay in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Optional cap on the computed delay, applied before jitter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    /// Add a random extra delay on top of the computed one
    #[serde(default)]
    pub jitter: bool,

    /// Exclusive upper bound of the jitter term in milliseconds
    #[serde(default = "default_max_jitter")]
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: RetryStrategy::default(),
            backoff_multiplier: default_backoff_multiplier(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: None,
            jitter: false,
            max_jitter_ms: default_max_jitter(),
        }
    }
}

impl RetryPolicy {
    /// Check the invariants the executor relies on
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_config("max-attempts must be at least 1"));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::invalid_config(
                "backoff-multiplier must be a finite number >= 1.0",
            ));
        }
        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_initial_delay() -> u64 {
    1000
}
fn default_max_jitter() -> u64 {
    1000
}

/// Retry strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetryStrategy {
    /// Retry immediately
    None,

    /// Fixed delay between retries
    FixedDelay,

    /// Exponential backoff (default)
    #[default]
    ExponentialBackoff,

    /// Linear backoff
    LinearBackoff,
}
