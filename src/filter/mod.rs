//! False-positive suppression
//!
//! Rule-driven removal of candidate spans that match known non-PII
//! contexts: form-field labels, non-entity words the model over-triggers
//! on, and quoted/title-like text. Rules are data, loaded once at startup
//! (embedded defaults, overridable by file) and shared read-only across
//! requests. Filtering is a pure function of (span, text, rules); this
//! stage never adds spans.
//!
//! Rule patterns are `fancy-regex` expressions, so suppression rules may
//! use lookaround when a plain window anchor is not enough.

use crate::domain::errors::VeilError;
use crate::domain::result::Result;
use crate::domain::span::{char_len, char_slice, PiiCategory, PiiSpan};
use fancy_regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// Default context window radius in characters
pub const DEFAULT_CONTEXT_RADIUS: usize = 40;

/// Where a rule's pattern is applied relative to the candidate span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTrigger {
    /// The window of text immediately preceding the span
    Preceding,
    /// The window of text immediately following the span
    Following,
    /// The span's own value
    Value,
    /// The surrounding window including the span
    Window,
}

/// Which categories a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
    /// Applies to candidates of every category
    Global,
    /// Applies only to candidates of one category
    Category(PiiCategory),
}

/// Raw rule definition from TOML
#[derive(Debug, Clone, Deserialize)]
struct RuleDefinition {
    name: String,
    pattern: String,
    scope: String,
    trigger: String,
    action: String,
}

/// Rule file container
#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<RuleDefinition>,
}

/// A compiled suppression rule
#[derive(Debug)]
pub struct FilterRule {
    /// Rule name, for logs and tests
    pub name: String,
    /// Compiled pattern
    pub regex: Regex,
    /// Category scope
    pub scope: RuleScope,
    /// Trigger position
    pub trigger: RuleTrigger,
}

impl FilterRule {
    fn from_definition(def: &RuleDefinition) -> Result<Self> {
        if def.action != "suppress" {
            return Err(VeilError::Configuration(format!(
                "Rule '{}' has unsupported action '{}'; only 'suppress' is supported",
                def.name, def.action
            )));
        }

        let scope = match def.scope.as_str() {
            "global" => RuleScope::Global,
            other => RuleScope::Category(other.parse().map_err(|e| {
                VeilError::Configuration(format!("Rule '{}' has invalid scope: {e}", def.name))
            })?),
        };

        let trigger = match def.trigger.as_str() {
            "preceding" => RuleTrigger::Preceding,
            "following" => RuleTrigger::Following,
            "value" => RuleTrigger::Value,
            "window" => RuleTrigger::Window,
            other => {
                return Err(VeilError::Configuration(format!(
                    "Rule '{}' has unknown trigger '{other}'",
                    def.name
                )))
            }
        };

        let regex = Regex::new(&def.pattern).map_err(|e| {
            VeilError::Configuration(format!("Rule '{}' has invalid pattern: {e}", def.name))
        })?;

        Ok(Self {
            name: def.name.clone(),
            regex,
            scope,
            trigger,
        })
    }

    fn applies_to(&self, category: PiiCategory) -> bool {
        match self.scope {
            RuleScope::Global => true,
            RuleScope::Category(c) => c == category,
        }
    }
}

/// Immutable, load-once rule table
pub struct FilterRuleSet {
    rules: Vec<FilterRule>,
    radius: usize,
}

impl FilterRuleSet {
    /// Load the embedded default rules
    pub fn default_rules() -> Result<Self> {
        Self::from_toml(include_str!("../../rules/suppression_rules.toml"))
    }

    /// Load rules from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            VeilError::Configuration(format!(
                "Failed to read suppression rules {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse rules from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(content)
            .map_err(|e| VeilError::Configuration(format!("Invalid suppression rules: {e}")))?;

        let rules = file
            .rules
            .iter()
            .map(FilterRule::from_definition)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            radius: DEFAULT_CONTEXT_RADIUS,
        })
    }

    /// Override the context window radius
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius;
        self
    }

    /// Number of loaded rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the rule set is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rule-driven false-positive filter
pub struct FalsePositiveFilter {
    rules: Arc<FilterRuleSet>,
}

impl FalsePositiveFilter {
    /// Create a filter over the embedded default rules
    pub fn new() -> Result<Self> {
        Ok(Self {
            rules: Arc::new(FilterRuleSet::default_rules()?),
        })
    }

    /// Create a filter over a custom rule set
    pub fn with_rules(rules: FilterRuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// Drop every candidate a rule suppresses, preserving order
    pub fn apply(&self, text: &str, candidates: Vec<PiiSpan>) -> Vec<PiiSpan> {
        candidates
            .into_iter()
            .filter(|span| {
                let suppressed_by = self.matching_rule(text, span);
                if let Some(rule) = suppressed_by {
                    tracing::debug!(
                        rule = %rule,
                        category = %span.category,
                        start = span.start,
                        end = span.end,
                        "Suppressed candidate span"
                    );
                }
                suppressed_by.is_none()
            })
            .collect()
    }

    /// Check a single candidate; returns the name of the first matching rule
    pub fn matching_rule(&self, text: &str, span: &PiiSpan) -> Option<&str> {
        let total = char_len(text);

        for rule in &self.rules.rules {
            if !rule.applies_to(span.category) {
                continue;
            }

            let haystack = match rule.trigger {
                RuleTrigger::Preceding => {
                    let window_start = span.start.saturating_sub(self.rules.radius);
                    char_slice(text, window_start, span.start)
                }
                RuleTrigger::Following => {
                    let window_end = (span.end + self.rules.radius).min(total);
                    char_slice(text, span.end, window_end)
                }
                RuleTrigger::Value => Some(span.value.as_str()),
                RuleTrigger::Window => {
                    let window_start = span.start.saturating_sub(self.rules.radius);
                    let window_end = (span.end + self.rules.radius).min(total);
                    char_slice(text, window_start, window_end)
                }
            };

            let Some(haystack) = haystack else {
                continue;
            };

            // A backtracking error counts as no-match so filtering stays a
            // total function of its inputs
            if rule.regex.is_match(haystack).unwrap_or(false) {
                return Some(&rule.name);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::span::SpanSource;

    fn candidate(text: &str, value: &str, category: PiiCategory) -> PiiSpan {
        let byte_start = text.find(value).expect("value present in text");
        let start = crate::domain::span::byte_to_char(text, byte_start);
        PiiSpan::new(
            category,
            value,
            start,
            start + value.chars().count(),
            SpanSource::Pattern,
        )
    }

    fn filter() -> FalsePositiveFilter {
        FalsePositiveFilter::new().unwrap()
    }

    #[test]
    fn test_field_label_prefix_suppression() {
        let text = "Library Card ID: 4521";
        let span = candidate(text, "4521", PiiCategory::Name);
        assert_eq!(
            filter().matching_rule(text, &span),
            Some("field_label_prefix")
        );
    }

    #[test]
    fn test_label_span_suppression() {
        let text = "Shipping Address: 12 Elm Street";
        let span = candidate(text, "Shipping Address", PiiCategory::Name);
        assert_eq!(filter().matching_rule(text, &span), Some("label_span"));
    }

    #[test]
    fn test_non_entity_word_suppression() {
        let text = "See Invoice for details";
        let span = candidate(text, "Invoice", PiiCategory::Name);
        assert_eq!(
            filter().matching_rule(text, &span),
            Some("non_entity_words")
        );
    }

    #[test]
    fn test_title_context_suppression() {
        let text = "The book titled 123-45-6789 sold well";
        let span = candidate(text, "123-45-6789", PiiCategory::Ssn);
        assert_eq!(filter().matching_rule(text, &span), Some("title_context"));
    }

    #[test]
    fn test_real_pii_not_suppressed() {
        let text = "Please email jane@example.com about the meeting";
        let span = candidate(text, "jane@example.com", PiiCategory::Email);
        assert_eq!(filter().matching_rule(text, &span), None);
    }

    #[test]
    fn test_scope_restricts_rule() {
        // label_span is scoped to name; an email before a colon survives
        let text = "jane@example.com: primary contact";
        let span = candidate(text, "jane@example.com", PiiCategory::Email);
        assert_eq!(filter().matching_rule(text, &span), None);
    }

    #[test]
    fn test_apply_preserves_order_and_unsuppressed() {
        let text = "Library Card ID: 4521, reach jane@example.com";
        let spans = vec![
            candidate(text, "4521", PiiCategory::Name),
            candidate(text, "jane@example.com", PiiCategory::Email),
        ];

        let kept = filter().apply(text, spans);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].value, "jane@example.com");
    }

    #[test]
    fn test_filtering_is_deterministic() {
        let text = "Library Card ID: 4521, reach jane@example.com";
        let spans = || {
            vec![
                candidate(text, "4521", PiiCategory::Name),
                candidate(text, "jane@example.com", PiiCategory::Email),
            ]
        };

        let first = filter().apply(text, spans());
        let second = filter().apply(text, spans());
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_action_rejected() {
        let toml = r#"
[[rules]]
name = "bad"
pattern = 'x'
scope = "global"
trigger = "value"
action = "rewrite"
"#;
        assert!(FilterRuleSet::from_toml(toml).is_err());
    }

    #[test]
    fn test_custom_rule_set_with_lookahead() {
        let toml = r#"
[[rules]]
name = "quoted_value"
pattern = '^(?=")'
scope = "global"
trigger = "following"
action = "suppress"
"#;
        let rules = FilterRuleSet::from_toml(toml).unwrap();
        let filter = FalsePositiveFilter::with_rules(rules);

        let text = r#"call "555-123-4567" the demo line"#;
        let span = candidate(text, "555-123-4567", PiiCategory::Phone);
        assert_eq!(filter.matching_rule(text, &span), Some("quoted_value"));
    }
}
