//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Veil configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Application: {}", config.application.name);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Validation Endpoint: {}", config.llm.base_url);
        println!("  Validation Model: {}", config.llm.model);
        println!(
            "  API Key: {}",
            if config.llm.api_key.is_some() {
                "configured"
            } else {
                "missing"
            }
        );
        println!("  Request Timeout: {}s", config.llm.timeout_seconds);
        println!("  Max Retries: {}", config.llm.retry.max_retries);
        println!(
            "  Pattern Library: {}",
            config
                .detection
                .pattern_library
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string())
        );
        println!(
            "  Suppression Rules: {}",
            config
                .detection
                .suppression_rules
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string())
        );
        println!("  Context Radius: {}", config.detection.context_radius);
        println!("  Max Input Chars: {}", config.limits.max_input_chars);
        println!();

        Ok(0)
    }
}
