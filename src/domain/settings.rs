//! Per-request redaction settings

use crate::domain::span::PiiCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Visual/textual form used to replace a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionStyle {
    /// Numbered placeholders like `[EMAIL_1]`
    Labels,
    /// A run of filler glyphs matching the span length
    BlackBoxes,
    /// A caller-supplied literal, unnumbered
    Custom,
}

impl Default for RedactionStyle {
    fn default() -> Self {
        Self::Labels
    }
}

/// Per-request redaction configuration
///
/// The enabled-category set is explicit: callers must state which categories
/// they want redacted, there is no implicit "everything" default at the
/// engine boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionSettings {
    /// Categories to redact
    pub categories: BTreeSet<PiiCategory>,

    /// Replacement style
    #[serde(default)]
    pub style: RedactionStyle,

    /// Literal replacement used only when `style` is `custom`
    #[serde(default)]
    pub custom_label: Option<String>,
}

impl RedactionSettings {
    /// Create settings for an explicit category set
    pub fn new(categories: impl IntoIterator<Item = PiiCategory>, style: RedactionStyle) -> Self {
        Self {
            categories: categories.into_iter().collect(),
            style,
            custom_label: None,
        }
    }

    /// Convenience constructor enabling every known category
    pub fn all_categories(style: RedactionStyle) -> Self {
        Self::new(PiiCategory::ALL, style)
    }

    /// Set the custom replacement label
    pub fn with_custom_label(mut self, label: impl Into<String>) -> Self {
        self.custom_label = Some(label.into());
        self
    }

    /// Check whether a category is enabled for redaction
    pub fn is_enabled(&self, category: PiiCategory) -> bool {
        self.categories.contains(&category)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.categories.is_empty() {
            return Err("At least one PII category must be enabled".to_string());
        }
        if self.style == RedactionStyle::Custom {
            match &self.custom_label {
                Some(label) if !label.is_empty() => {}
                _ => {
                    return Err(
                        "Custom redaction style requires a non-empty custom_label".to_string()
                    )
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_categories() {
        let settings = RedactionSettings::new(
            [PiiCategory::Email, PiiCategory::Phone],
            RedactionStyle::Labels,
        );
        assert!(settings.is_enabled(PiiCategory::Email));
        assert!(!settings.is_enabled(PiiCategory::Ssn));
    }

    #[test]
    fn test_validate_empty_categories() {
        let settings = RedactionSettings::new([], RedactionStyle::Labels);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_custom_requires_label() {
        let settings = RedactionSettings::all_categories(RedactionStyle::Custom);
        assert!(settings.validate().is_err());

        let settings = settings.with_custom_label("[REDACTED]");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_serde_round_trip() {
        let settings = RedactionSettings::all_categories(RedactionStyle::BlackBoxes);
        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("black_boxes"));

        let back: RedactionSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.style, RedactionStyle::BlackBoxes);
        assert_eq!(back.categories.len(), PiiCategory::ALL.len());
    }
}
