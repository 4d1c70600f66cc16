//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::VeilConfig;
use crate::config::secret::secret_string;
use crate::domain::errors::VeilError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`VeilConfig`]
/// 4. Applies environment variable overrides (`VEIL_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, TOML parsing fails, a
/// referenced environment variable is missing, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use veil::config::load_config;
///
/// let config = load_config("veil.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<VeilConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(VeilError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        VeilError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    // Perform environment variable substitution
    let contents = substitute_env_vars(&contents)?;

    // Parse TOML
    let mut config: VeilConfig = toml::from_str(&contents)
        .map_err(|e| VeilError::Configuration(format!("Failed to parse TOML: {e}")))?;

    // Apply environment variable overrides
    apply_env_overrides(&mut config);

    // Validate configuration
    config
        .validate()
        .map_err(|e| VeilError::Configuration(format!("Configuration validation failed: {e}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are left untouched. Returns an error if a referenced
/// environment variable is not set.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines - don't process env vars in comments
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(VeilError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the `VEIL_*` prefix
///
/// Variables follow the pattern `VEIL_<SECTION>_<KEY>`, for example
/// `VEIL_LLM_BASE_URL` or `VEIL_LIMITS_MAX_INPUT_CHARS`.
fn apply_env_overrides(config: &mut VeilConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("VEIL_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // LLM overrides
    if let Ok(val) = std::env::var("VEIL_LLM_BASE_URL") {
        config.llm.base_url = val;
    }
    if let Ok(val) = std::env::var("VEIL_LLM_MODEL") {
        config.llm.model = val;
    }
    if let Ok(val) = std::env::var("VEIL_LLM_API_KEY") {
        config.llm.api_key = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("VEIL_LLM_TIMEOUT_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.llm.timeout_seconds = seconds;
        }
    }
    if let Ok(val) = std::env::var("VEIL_LLM_MAX_RETRIES") {
        if let Ok(retries) = val.parse() {
            config.llm.retry.max_retries = retries;
        }
    }

    // Detection overrides
    if let Ok(val) = std::env::var("VEIL_DETECTION_PATTERN_LIBRARY") {
        config.detection.pattern_library = Some(val.into());
    }
    if let Ok(val) = std::env::var("VEIL_DETECTION_SUPPRESSION_RULES") {
        config.detection.suppression_rules = Some(val.into());
    }
    if let Ok(val) = std::env::var("VEIL_DETECTION_NAME_GAZETTEER") {
        config.detection.name_gazetteer = Some(val.into());
    }
    if let Ok(val) = std::env::var("VEIL_DETECTION_CONTEXT_RADIUS") {
        if let Ok(radius) = val.parse() {
            config.detection.context_radius = radius;
        }
    }

    // Limits overrides
    if let Ok(val) = std::env::var("VEIL_LIMITS_MAX_INPUT_CHARS") {
        if let Ok(max) = val.parse() {
            config.limits.max_input_chars = max;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("VEIL_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("VEIL_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
