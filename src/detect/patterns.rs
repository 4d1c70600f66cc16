//! Pattern library for structural PII detection

use crate::domain::errors::VeilError;
use crate::domain::result::Result;
use crate::domain::span::PiiCategory;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this category
    pub patterns: Vec<String>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// PII category label
    pub category: String,
    /// Optional capture group whose offsets define the span (0 = whole match)
    #[serde(default)]
    pub capture_group: Option<usize>,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Compiled regex
    pub regex: Regex,
    /// PII category
    pub category: PiiCategory,
    /// Confidence score
    pub confidence: f32,
    /// Capture group whose offsets define the span
    pub capture_group: usize,
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: HashMap<String, PatternDefinition>,
}

/// Pattern registry for structural PII detection
///
/// Loaded once at startup and shared read-only across requests.
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
    patterns_by_category: HashMap<PiiCategory, Vec<CompiledPattern>>,
}

impl PatternRegistry {
    /// Create a new pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            VeilError::Configuration(format!(
                "Failed to read pattern library {}: {e}",
                path.as_ref().display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary = toml::from_str(content)
            .map_err(|e| VeilError::Configuration(format!("Invalid pattern library: {e}")))?;

        let mut patterns = Vec::new();
        let mut patterns_by_category: HashMap<PiiCategory, Vec<CompiledPattern>> = HashMap::new();

        for (name, def) in library.patterns {
            let category = Self::parse_category(&def.category).map_err(|e| {
                VeilError::Configuration(format!("Invalid category in pattern '{name}': {e}"))
            })?;

            for pattern_str in &def.patterns {
                let regex = Regex::new(pattern_str).map_err(|e| {
                    VeilError::Configuration(format!(
                        "Invalid regex in pattern '{name}': {pattern_str}: {e}"
                    ))
                })?;

                let compiled = CompiledPattern {
                    regex,
                    category,
                    confidence: def.confidence,
                    capture_group: def.capture_group.unwrap_or(0),
                };

                patterns.push(compiled.clone());
                patterns_by_category
                    .entry(category)
                    .or_default()
                    .push(compiled);
            }
        }

        Ok(Self {
            patterns,
            patterns_by_category,
        })
    }

    /// Create a default pattern registry with the built-in patterns
    pub fn default_patterns() -> Result<Self> {
        // Use embedded default patterns
        let default_toml = include_str!("../../patterns/pii_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// Get all patterns
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Get patterns for a specific category
    pub fn patterns_for_category(&self, category: PiiCategory) -> Option<&[CompiledPattern]> {
        self.patterns_by_category
            .get(&category)
            .map(|v| v.as_slice())
    }

    /// Parse category string to PiiCategory enum
    fn parse_category(s: &str) -> std::result::Result<PiiCategory, String> {
        match s.to_uppercase().as_str() {
            "EMAIL" => Ok(PiiCategory::Email),
            "PHONE" => Ok(PiiCategory::Phone),
            "NAME" => Ok(PiiCategory::Name),
            "ADDRESS" => Ok(PiiCategory::Address),
            "SSN" => Ok(PiiCategory::Ssn),
            "CREDIT_CARD" | "CARD" => Ok(PiiCategory::CreditCard),
            _ => Err(format!("Unknown PII category: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();
        assert!(!registry.all_patterns().is_empty());
    }

    #[test]
    fn test_email_pattern() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let email_patterns = registry.patterns_for_category(PiiCategory::Email).unwrap();
        assert!(!email_patterns.is_empty());

        let pattern = &email_patterns[0];
        assert!(pattern.regex.is_match("test@example.com"));
        assert!(!pattern.regex.is_match("not-an-email"));
    }

    #[test]
    fn test_phone_pattern() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let phone_patterns = registry.patterns_for_category(PiiCategory::Phone).unwrap();
        assert!(!phone_patterns.is_empty());

        let text = "Call me at (555) 123-4567";
        let has_match = phone_patterns.iter().any(|p| p.regex.is_match(text));
        assert!(has_match);
    }

    #[test]
    fn test_username_pattern_captures_handle() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let name_patterns = registry.patterns_for_category(PiiCategory::Name).unwrap();

        let text = "username is jdoe42";
        let captured = name_patterns.iter().find_map(|p| {
            p.regex
                .captures(text)
                .and_then(|c| c.get(p.capture_group))
                .map(|m| m.as_str())
        });
        assert_eq!(captured, Some("jdoe42"));
    }

    #[test]
    fn test_invalid_category_rejected() {
        let toml = r#"
[patterns.bogus]
category = "PASSPORT"
confidence = 0.5
patterns = ['\d+']
"#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let toml = r#"
[patterns.broken]
category = "EMAIL"
confidence = 0.5
patterns = ['(unclosed']
"#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }
}
