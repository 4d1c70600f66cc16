//! Init command implementation
//!
//! Writes a starter configuration file with commented defaults.

use clap::Args;
use std::path::PathBuf;

const CONFIG_TEMPLATE: &str = r#"# Veil configuration

[application]
# Log level: trace, debug, info, warn, error
log_level = "info"

[llm]
# Chat-completions endpoint of the validation service
base_url = "https://api.openai.com/v1"
model = "gpt-4o-mini"
# Read from the environment so the key never lands in the file
api_key = "${VEIL_LLM_API_KEY}"
timeout_seconds = 30

[llm.retry]
max_retries = 3
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 2.0

[detection]
# Uncomment to override the built-in resources
# pattern_library = "patterns/pii_patterns.toml"
# suppression_rules = "rules/suppression_rules.toml"
# name_gazetteer = "patterns/given_names.txt"
context_radius = 40
confidence_threshold = 0.7

[limits]
max_input_chars = 50000

[logging]
local_enabled = false
local_path = "./logs"
local_rotation = "daily"
"#;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Destination path for the configuration file
    #[arg(short, long, default_value = "veil.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        if self.output.exists() && !self.force {
            eprintln!(
                "❌ {} already exists (use --force to overwrite)",
                self.output.display()
            );
            return Ok(2);
        }

        tokio::fs::write(&self.output, CONFIG_TEMPLATE).await?;

        println!("✅ Wrote configuration template to {}", self.output.display());
        println!("   Set VEIL_LLM_API_KEY before running `veil redact`.");
        Ok(0)
    }
}
