//! Structural pattern detector
//!
//! Runs every enabled pattern rule over the raw text and emits candidate
//! spans. This stage is intentionally over-inclusive: context-based
//! suppression belongs to the false-positive filter and the validation
//! stage, not here. Detection is a pure function of (text, registry,
//! enabled categories).

use crate::detect::patterns::PatternRegistry;
use crate::domain::span::{byte_to_char, PiiCategory, PiiSpan, SpanSource};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// Regex-based structural PII detector
pub struct PatternDetector {
    registry: Arc<PatternRegistry>,
    confidence_threshold: f32,
}

impl PatternDetector {
    /// Create a detector over the built-in pattern library
    pub fn new() -> crate::domain::Result<Self> {
        let registry = PatternRegistry::default_patterns()?;
        Ok(Self::with_registry(registry))
    }

    /// Create a detector over a custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            confidence_threshold: 0.7,
        }
    }

    /// Set the confidence threshold below which patterns are ignored
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Detect candidate spans for the enabled categories
    ///
    /// Offsets in the returned spans are character offsets into `text`.
    /// Duplicate (category, start, end) triples produced by overlapping
    /// pattern variants are collapsed to one span.
    pub fn detect(&self, text: &str, enabled: &BTreeSet<PiiCategory>) -> Vec<PiiSpan> {
        let mut spans = Vec::new();
        let mut seen: HashSet<(PiiCategory, usize, usize)> = HashSet::new();

        for pattern in self.registry.all_patterns() {
            if pattern.confidence < self.confidence_threshold {
                continue;
            }
            if !enabled.contains(&pattern.category) {
                continue;
            }

            for captures in pattern.regex.captures_iter(text) {
                let Some(matched) = captures.get(pattern.capture_group) else {
                    continue;
                };

                let value = matched.as_str();
                if !Self::passes_post_checks(pattern.category, value) {
                    continue;
                }
                if pattern.capture_group != 0 && Self::inside_email_context(text, &captures) {
                    continue;
                }

                let start = byte_to_char(text, matched.start());
                let end = byte_to_char(text, matched.end());
                if !seen.insert((pattern.category, start, end)) {
                    continue;
                }

                spans.push(PiiSpan::new(
                    pattern.category,
                    value,
                    start,
                    end,
                    SpanSource::Pattern,
                ));
            }
        }

        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        spans
    }

    /// Structural post-validation applied after the regex match
    fn passes_post_checks(category: PiiCategory, value: &str) -> bool {
        match category {
            // Phone matches must carry at least 10 digits
            PiiCategory::Phone => value.chars().filter(char::is_ascii_digit).count() >= 10,
            // Card matches must be exactly 16 digits once delimiters drop out
            PiiCategory::CreditCard => {
                value.chars().filter(char::is_ascii_digit).count() == 16
            }
            _ => true,
        }
    }

    /// Skip handle captures that are really the local part of an email
    fn inside_email_context(text: &str, captures: &regex::Captures<'_>) -> bool {
        let Some(whole) = captures.get(0) else {
            return false;
        };
        let window_start = whole.start().saturating_sub(10);
        let window_end = (whole.end() + 10).min(text.len());
        match text.get(window_start..window_end) {
            Some(window) => window.contains('@'),
            // Window edges split a multibyte char; widen to char boundaries
            None => text[whole.start()..whole.end()].contains('@'),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::span::char_slice;

    fn all_enabled() -> BTreeSet<PiiCategory> {
        PiiCategory::ALL.into_iter().collect()
    }

    fn detector() -> PatternDetector {
        PatternDetector::new().unwrap()
    }

    #[test]
    fn test_detect_email() {
        let spans = detector().detect("Contact: jane@example.com today", &all_enabled());
        let emails: Vec<_> = spans
            .iter()
            .filter(|s| s.category == PiiCategory::Email)
            .collect();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].value, "jane@example.com");
        assert_eq!(emails[0].start, 9);
        assert_eq!(emails[0].end, 25);
    }

    #[test]
    fn test_detect_phone_variants_deduplicated() {
        let spans = detector().detect("Call (555) 123-4567 or 555-987-6543", &all_enabled());
        let phones: Vec<_> = spans
            .iter()
            .filter(|s| s.category == PiiCategory::Phone)
            .collect();
        assert_eq!(phones.len(), 2);
    }

    #[test]
    fn test_phone_requires_ten_digits() {
        let spans = detector().detect("extension 555-1234", &all_enabled());
        assert!(spans
            .iter()
            .all(|s| s.category != PiiCategory::Phone));
    }

    #[test]
    fn test_detect_ssn() {
        let spans = detector().detect("SSN: 123-45-6789 on file", &all_enabled());
        let ssns: Vec<_> = spans
            .iter()
            .filter(|s| s.category == PiiCategory::Ssn)
            .collect();
        assert_eq!(ssns.len(), 1);
        assert_eq!(ssns[0].value, "123-45-6789");
    }

    #[test]
    fn test_detect_credit_card_digit_count() {
        let spans = detector().detect("Card: 4532-1488-0343-6467", &all_enabled());
        assert!(spans
            .iter()
            .any(|s| s.category == PiiCategory::CreditCard));

        // 12 digits is not a card
        let spans = detector().detect("Order 1234-5678-9012", &all_enabled());
        assert!(spans
            .iter()
            .all(|s| s.category != PiiCategory::CreditCard));
    }

    #[test]
    fn test_detect_address() {
        let spans = detector().detect(
            "Ship to 123 Main Street, Springfield, IL 62704 please",
            &all_enabled(),
        );
        let addresses: Vec<_> = spans
            .iter()
            .filter(|s| s.category == PiiCategory::Address)
            .collect();
        assert_eq!(addresses.len(), 1);
        assert!(addresses[0].value.starts_with("123 Main Street"));
    }

    #[test]
    fn test_detect_username_handle() {
        let spans = detector().detect("my username is jdoe42 thanks", &all_enabled());
        let names: Vec<_> = spans
            .iter()
            .filter(|s| s.category == PiiCategory::Name)
            .collect();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].value, "jdoe42");
    }

    #[test]
    fn test_username_skipped_in_email_context() {
        let spans = detector().detect("login: jdoe42@example.com", &all_enabled());
        assert!(spans
            .iter()
            .all(|s| s.category != PiiCategory::Name));
    }

    #[test]
    fn test_disabled_categories_not_emitted() {
        let enabled: BTreeSet<_> = [PiiCategory::Phone].into_iter().collect();
        let spans = detector().detect("jane@example.com or (555) 123-4567", &enabled);
        assert!(spans.iter().all(|s| s.category == PiiCategory::Phone));
        assert_eq!(spans.len(), 1);
    }

    #[test]
    fn test_offsets_are_character_offsets() {
        let text = "héllo jane@example.com";
        let spans = detector().detect(text, &all_enabled());
        let email = spans
            .iter()
            .find(|s| s.category == PiiCategory::Email)
            .unwrap();
        assert_eq!(
            char_slice(text, email.start, email.end).unwrap(),
            email.value
        );
    }

    #[test]
    fn test_detection_is_deterministic() {
        let text = "jane@example.com, 555-123-4567, SSN 123-45-6789";
        let first = detector().detect(text, &all_enabled());
        let second = detector().detect(text, &all_enabled());
        assert_eq!(first, second);
    }
}
