//! Configuration management for Veil.
//!
//! This module provides TOML-based configuration loading, parsing, and
//! validation.
//!
//! # Overview
//!
//! Veil uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `VEIL_*` environment overrides
//! - Default values for optional settings
//! - Comprehensive validation
//! - Secret-wrapped credentials
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use veil::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("veil.toml")?;
//! println!("Validation endpoint: {}", config.llm.base_url);
//! println!("Input ceiling: {}", config.limits.max_input_chars);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used items
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DetectionConfig, LimitsConfig, LlmConfig, LoggingConfig, RetryConfig,
    VeilConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
