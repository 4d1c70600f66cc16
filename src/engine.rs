//! Redaction pipeline engine
//!
//! This module provides the core [`RedactionEngine`] that drives each
//! request through the fixed pipeline:
//!
//! ```text
//! Detect (patterns + entities) -> Filter -> Reconcile -> Validate -> Render
//! ```
//!
//! The pipeline is linear with no back-branching. The validation stage is
//! mandatory: when it fails, the request fails. Detection, filtering, and
//! reconciliation are pure functions over well-formed input; an error there
//! indicates a programming bug, not an operational condition.
//!
//! # Concurrency
//!
//! The engine holds only load-once, read-only resources (pattern registry,
//! entity model, rule table, validator client) and is safe to share across
//! tasks via `Arc`. All per-request data is request-local. The only
//! suspending operation is the validation call, which carries its own
//! timeout and is cancel-safe.

use crate::config::VeilConfig;
use crate::detect::{EntityDetector, LexiconTagger, PatternDetector, PatternRegistry};
use crate::domain::errors::VeilError;
use crate::domain::outcome::RedactionOutcome;
use crate::domain::result::Result;
use crate::domain::settings::RedactionSettings;
use crate::domain::span::{char_len, PiiCategory, PiiSpan};
use crate::filter::{FalsePositiveFilter, FilterRuleSet};
use crate::reconcile::reconcile;
use crate::render::render;
use crate::stats;
use crate::validate::{LlmValidator, SpanValidator};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Core redaction engine
///
/// # Examples
///
/// ```no_run
/// use veil::config::VeilConfig;
/// use veil::domain::{RedactionSettings, RedactionStyle};
/// use veil::engine::RedactionEngine;
///
/// # async fn example() -> veil::domain::Result<()> {
/// let config = VeilConfig::default();
/// let engine = RedactionEngine::new(&config)?;
///
/// let settings = RedactionSettings::all_categories(RedactionStyle::Labels);
/// let outcome = engine
///     .redact("Contact: jane@example.com", &settings)
///     .await?;
/// println!("{}", outcome.redacted);
/// # Ok(())
/// # }
/// ```
pub struct RedactionEngine {
    pattern_detector: PatternDetector,
    entity_detector: EntityDetector,
    filter: FalsePositiveFilter,
    validator: Arc<dyn SpanValidator>,
    max_input_chars: usize,
}

impl RedactionEngine {
    /// Create an engine from configuration
    ///
    /// Loads the pattern library, entity model, and suppression rules once;
    /// the resulting engine is read-only and shareable.
    pub fn new(config: &VeilConfig) -> Result<Self> {
        let validator: Arc<dyn SpanValidator> = Arc::new(LlmValidator::new(&config.llm)?);
        Self::with_validator(config, validator)
    }

    /// Create an engine with a custom validation backend
    pub fn with_validator(
        config: &VeilConfig,
        validator: Arc<dyn SpanValidator>,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(VeilError::Configuration)?;

        let registry = match &config.detection.pattern_library {
            Some(path) => PatternRegistry::from_file(path)?,
            None => PatternRegistry::default_patterns()?,
        };
        let pattern_detector = PatternDetector::with_registry(registry)
            .with_confidence_threshold(config.detection.confidence_threshold);

        let entity_detector = match &config.detection.name_gazetteer {
            Some(path) => {
                EntityDetector::with_model(Arc::new(LexiconTagger::from_file(path)?))
            }
            None => EntityDetector::new()?,
        };

        let rules = match &config.detection.suppression_rules {
            Some(path) => FilterRuleSet::from_file(path)?,
            None => FilterRuleSet::default_rules()?,
        };
        let filter =
            FalsePositiveFilter::with_rules(rules.with_radius(config.detection.context_radius));

        Ok(Self {
            pattern_detector,
            entity_detector,
            filter,
            validator,
            max_input_chars: config.limits.max_input_chars,
        })
    }

    /// Run the full pipeline over one text
    ///
    /// Returns a complete [`RedactionOutcome`] or exactly one error; there
    /// is no partial success.
    pub async fn redact(
        &self,
        text: &str,
        settings: &RedactionSettings,
    ) -> Result<RedactionOutcome> {
        let start = Instant::now();
        let request_id = Uuid::new_v4();

        self.check_input(text)?;
        settings.validate().map_err(VeilError::Input)?;

        // Detection: both layers run independently over the same text.
        // Disabled categories are skipped here and filtered again after
        // discovery, since the validator may return spans for them.
        let mut candidates = self.pattern_detector.detect(text, &settings.categories);

        if settings.is_enabled(PiiCategory::Name) || settings.is_enabled(PiiCategory::Address) {
            let entities = self.entity_detector.detect(text)?;
            candidates.extend(
                entities
                    .into_iter()
                    .filter(|span| settings.is_enabled(span.category)),
            );
        }

        tracing::debug!(
            request_id = %request_id,
            candidates = candidates.len(),
            "Detection complete"
        );

        let filtered = self.filter.apply(text, candidates);
        let reconciled = reconcile(filtered);

        tracing::debug!(
            request_id = %request_id,
            candidates = reconciled.len(),
            "Candidates reconciled, requesting validation"
        );

        // Mandatory validation; a failure here fails the request.
        let validation = self.validator.validate(text, &reconciled).await?;

        for rejection in &validation.rejections {
            tracing::debug!(
                request_id = %request_id,
                category = %rejection.span.category,
                value_digest = %value_digest(&rejection.span.value),
                reason = %rejection.reason,
                "Validator rejected candidate"
            );
        }

        let explanation = validation.explanation.clone();
        let discovered = validation.discovered.len();

        // Discovered spans may overlap confirmed ones or belong to disabled
        // categories; reconcile once more over the merged confirmed set.
        let final_spans: Vec<PiiSpan> = reconcile(
            validation
                .all_confirmed()
                .into_iter()
                .filter(|span| settings.is_enabled(span.category))
                .collect(),
        );

        let redacted = render(text, &final_spans, settings)?;
        let statistics = stats::aggregate(&final_spans, settings);

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            request_id = %request_id,
            spans = final_spans.len(),
            discovered = discovered,
            processing_time_ms = processing_time_ms,
            "Redaction complete"
        );

        Ok(RedactionOutcome::new(
            request_id,
            text.to_string(),
            redacted,
            final_spans,
            statistics,
            explanation,
            processing_time_ms,
        ))
    }

    /// Reject empty or oversized input before pipeline entry
    fn check_input(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(VeilError::Input("Input text is empty".to_string()));
        }

        let length = char_len(text);
        if length > self.max_input_chars {
            return Err(VeilError::Input(format!(
                "Input text of {length} characters exceeds the limit of {} characters",
                self.max_input_chars
            )));
        }

        Ok(())
    }
}

/// Short digest standing in for a span value in logs, so log output never
/// carries raw PII
fn value_digest(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    digest[..4].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ValidatorError;
    use crate::domain::settings::RedactionStyle;
    use crate::validate::Validation;
    use async_trait::async_trait;

    /// Confirms every candidate; no discoveries
    struct ConfirmAll;

    #[async_trait]
    impl SpanValidator for ConfirmAll {
        async fn validate(
            &self,
            _text: &str,
            candidates: &[PiiSpan],
        ) -> std::result::Result<Validation, ValidatorError> {
            Ok(Validation {
                confirmed: candidates
                    .iter()
                    .cloned()
                    .map(PiiSpan::into_confirmed)
                    .collect(),
                rejections: Vec::new(),
                discovered: Vec::new(),
                explanation: "All candidates confirmed.".to_string(),
            })
        }
    }

    /// Always fails with a transport error
    struct Unreachable;

    #[async_trait]
    impl SpanValidator for Unreachable {
        async fn validate(
            &self,
            _text: &str,
            _candidates: &[PiiSpan],
        ) -> std::result::Result<Validation, ValidatorError> {
            Err(ValidatorError::ConnectionFailed("refused".to_string()))
        }
    }

    fn engine(validator: Arc<dyn SpanValidator>) -> RedactionEngine {
        RedactionEngine::with_validator(&VeilConfig::default(), validator).unwrap()
    }

    #[tokio::test]
    async fn test_basic_pipeline() {
        let engine = engine(Arc::new(ConfirmAll));
        let settings = RedactionSettings::new(
            [PiiCategory::Email, PiiCategory::Phone],
            RedactionStyle::Labels,
        );

        let outcome = engine
            .redact("Contact: jane@example.com or 555-123-4567", &settings)
            .await
            .unwrap();

        assert_eq!(outcome.redacted, "Contact: [EMAIL_1] or [PHONE_1]");
        assert_eq!(outcome.statistics[&PiiCategory::Email], 1);
        assert_eq!(outcome.statistics[&PiiCategory::Phone], 1);
        assert_eq!(outcome.statistics[&PiiCategory::Ssn], 0);
        assert_eq!(outcome.explanation, "All candidates confirmed.");
        assert!(outcome.spans.iter().all(|s| s.confirmed));
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let engine = engine(Arc::new(ConfirmAll));
        let settings = RedactionSettings::all_categories(RedactionStyle::Labels);

        let result = engine.redact("   ", &settings).await;
        assert!(matches!(result, Err(VeilError::Input(_))));
    }

    #[tokio::test]
    async fn test_oversized_input_rejected() {
        let mut config = VeilConfig::default();
        config.limits.max_input_chars = 10;
        let engine = RedactionEngine::with_validator(&config, Arc::new(ConfirmAll)).unwrap();
        let settings = RedactionSettings::all_categories(RedactionStyle::Labels);

        let result = engine.redact("this is longer than ten", &settings).await;
        assert!(matches!(result, Err(VeilError::Input(_))));
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let engine = engine(Arc::new(ConfirmAll));
        let settings = RedactionSettings::all_categories(RedactionStyle::Custom);

        let result = engine.redact("jane@example.com", &settings).await;
        assert!(matches!(result, Err(VeilError::Input(_))));
    }

    #[tokio::test]
    async fn test_validator_failure_fails_request() {
        let engine = engine(Arc::new(Unreachable));
        let settings = RedactionSettings::all_categories(RedactionStyle::Labels);

        let result = engine.redact("jane@example.com", &settings).await;
        assert!(matches!(result, Err(VeilError::Validator(_))));
    }

    #[tokio::test]
    async fn test_disabled_categories_pass_through() {
        let engine = engine(Arc::new(ConfirmAll));
        let settings = RedactionSettings::new([PiiCategory::Email], RedactionStyle::Labels);

        let outcome = engine
            .redact("jane@example.com or 555-123-4567", &settings)
            .await
            .unwrap();

        assert_eq!(outcome.redacted, "[EMAIL_1] or 555-123-4567");
        assert_eq!(outcome.statistics[&PiiCategory::Phone], 0);
    }

    #[tokio::test]
    async fn test_field_label_suppression_end_to_end() {
        let engine = engine(Arc::new(ConfirmAll));
        let settings = RedactionSettings::all_categories(RedactionStyle::Labels);

        let outcome = engine.redact("Library Card ID: 4521", &settings).await.unwrap();

        assert_eq!(outcome.redacted, "Library Card ID: 4521");
        assert!(outcome.statistics.values().all(|&c| c == 0));
    }

    #[tokio::test]
    async fn test_redetection_is_idempotent() {
        let engine = engine(Arc::new(ConfirmAll));
        let settings = RedactionSettings::all_categories(RedactionStyle::Labels);
        let text = "Emily Johnson, jane@example.com, 555-123-4567, SSN 123-45-6789";

        let first = engine.redact(text, &settings).await.unwrap();
        let second = engine.redact(text, &settings).await.unwrap();

        assert_eq!(first.redacted, second.redacted);
        assert_eq!(first.spans, second.spans);
        assert_eq!(first.statistics, second.statistics);
    }

    #[tokio::test]
    async fn test_finalized_set_is_disjoint_and_faithful() {
        let engine = engine(Arc::new(ConfirmAll));
        let settings = RedactionSettings::all_categories(RedactionStyle::Labels);
        let text = "Dr. Emily Johnson <emily.johnson@example.com> lives at \
                    123 Main Street, Springfield, IL 62704; card 4532-1488-0343-6467.";

        let outcome = engine.redact(text, &settings).await.unwrap();

        for span in &outcome.spans {
            assert!(span.matches_text(text), "value fidelity for {span:?}");
        }
        for pair in outcome.spans.windows(2) {
            assert!(!pair[0].overlaps(&pair[1]));
            assert!(pair[0].start <= pair[1].start);
        }
    }

    #[test]
    fn test_value_digest_is_stable_and_short() {
        assert_eq!(value_digest("abc"), value_digest("abc"));
        assert_eq!(value_digest("abc").len(), 8);
        assert_ne!(value_digest("abc"), value_digest("abd"));
    }
}
