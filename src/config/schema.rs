//! Configuration schema types
//!
//! This module defines the configuration structure for Veil. All sections
//! except `[llm]` have usable defaults; the validation service endpoint is
//! the one thing a deployment must always state.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level Veil configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VeilConfig {
    /// Application metadata and log level
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Validation service (LLM) connection
    pub llm: LlmConfig,

    /// Detection resources and tuning
    #[serde(default)]
    pub detection: DetectionConfig,

    /// Input limits
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl VeilConfig {
    /// Validate the full configuration
    pub fn validate(&self) -> Result<(), String> {
        self.llm.validate()?;
        self.detection.validate()?;
        self.limits.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

impl Default for VeilConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            llm: LlmConfig::default(),
            detection: DetectionConfig::default(),
            limits: LimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Application metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name used in logs
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_app_name() -> String {
    "veil".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Validation service (LLM) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the chat-completions endpoint
    pub base_url: String,

    /// Model identifier sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// API key for the service
    ///
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry policy for transient transport failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: default_model(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
            retry: RetryConfig::default(),
        }
    }
}

impl LlmConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("llm.base_url cannot be empty".to_string());
        }

        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| format!("llm.base_url is not a valid URL: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err("llm.base_url must use http:// or https://".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("llm.timeout_seconds must be greater than zero".to_string());
        }

        self.retry.validate()
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Retry policy with exponential backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("llm.retry.max_retries must be at least 1".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("llm.retry.backoff_multiplier must be >= 1.0".to_string());
        }
        Ok(())
    }
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

/// Detection resources and tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Path to a pattern library TOML file (embedded defaults when unset)
    pub pattern_library: Option<PathBuf>,

    /// Path to a suppression rules TOML file (embedded defaults when unset)
    pub suppression_rules: Option<PathBuf>,

    /// Path to a given-name gazetteer file (embedded defaults when unset)
    pub name_gazetteer: Option<PathBuf>,

    /// Context window radius for suppression rules, in characters
    #[serde(default = "default_context_radius")]
    pub context_radius: usize,

    /// Confidence threshold below which pattern rules are ignored
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            pattern_library: None,
            suppression_rules: None,
            name_gazetteer: None,
            context_radius: default_context_radius(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<(), String> {
        for (label, path) in [
            ("detection.pattern_library", &self.pattern_library),
            ("detection.suppression_rules", &self.suppression_rules),
        ] {
            if let Some(path) = path {
                if !path.exists() {
                    return Err(format!("{label} file not found: {}", path.display()));
                }
                if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                    return Err(format!("{label} must be a TOML file: {}", path.display()));
                }
            }
        }

        if let Some(ref path) = self.name_gazetteer {
            if !path.exists() {
                return Err(format!(
                    "detection.name_gazetteer file not found: {}",
                    path.display()
                ));
            }
        }

        if self.context_radius == 0 {
            return Err("detection.context_radius must be greater than zero".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("detection.confidence_threshold must be within 0.0..=1.0".to_string());
        }

        Ok(())
    }
}

fn default_context_radius() -> usize {
    40
}

fn default_confidence_threshold() -> f32 {
    0.7
}

/// Input limits enforced before pipeline entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum input length in characters
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
        }
    }
}

impl LimitsConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_input_chars == 0 {
            return Err("limits.max_input_chars must be greater than zero".to_string());
        }
        Ok(())
    }
}

fn default_max_input_chars() -> usize {
    50_000
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy ("daily" or "hourly")
    #[serde(default = "default_log_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_log_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if !matches!(self.local_rotation.as_str(), "daily" | "hourly") {
            return Err(format!(
                "logging.local_rotation must be 'daily' or 'hourly', got '{}'",
                self.local_rotation
            ));
        }
        Ok(())
    }
}

fn default_log_path() -> String {
    "./logs".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}
