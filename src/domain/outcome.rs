//! Redaction result payload

use crate::domain::span::{PiiCategory, PiiSpan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Completed redaction result
///
/// Constructed once per request and returned to the caller; the engine keeps
/// no cross-request state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionOutcome {
    /// Request identifier, for correlation with logs
    pub request_id: Uuid,
    /// Original input text
    pub original: String,
    /// Redacted copy of the input
    pub redacted: String,
    /// Finalized spans, restricted to enabled categories, ordered by start
    pub spans: Vec<PiiSpan>,
    /// Per-category counts; zero-count categories are present
    pub statistics: BTreeMap<PiiCategory, usize>,
    /// Natural-language explanation produced by the validation stage
    pub explanation: String,
    /// Pipeline processing time in milliseconds
    pub processing_time_ms: u64,
    /// Timestamp of completion
    pub timestamp: DateTime<Utc>,
}

impl RedactionOutcome {
    /// Assemble an outcome from the finalized pipeline artifacts
    pub fn new(
        request_id: Uuid,
        original: String,
        redacted: String,
        spans: Vec<PiiSpan>,
        statistics: BTreeMap<PiiCategory, usize>,
        explanation: String,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            request_id,
            original,
            redacted,
            spans,
            statistics,
            explanation,
            processing_time_ms,
            timestamp: Utc::now(),
        }
    }

    /// Total number of redacted spans
    pub fn total_spans(&self) -> usize {
        self.spans.len()
    }

    /// Check if any PII was redacted
    pub fn has_detections(&self) -> bool {
        !self.spans.is_empty()
    }

    /// Spans of a single category, in reading order
    pub fn spans_for(&self, category: PiiCategory) -> Vec<&PiiSpan> {
        self.spans
            .iter()
            .filter(|s| s.category == category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::span::SpanSource;

    #[test]
    fn test_outcome_accessors() {
        let spans = vec![
            PiiSpan::new(
                PiiCategory::Email,
                "a@b.co",
                0,
                6,
                SpanSource::Pattern,
            )
            .into_confirmed(),
        ];
        let mut statistics = BTreeMap::new();
        for category in PiiCategory::ALL {
            statistics.insert(category, 0);
        }
        statistics.insert(PiiCategory::Email, 1);

        let outcome = RedactionOutcome::new(
            Uuid::new_v4(),
            "a@b.co".to_string(),
            "[EMAIL_1]".to_string(),
            spans,
            statistics,
            "One email address was redacted.".to_string(),
            12,
        );

        assert!(outcome.has_detections());
        assert_eq!(outcome.total_spans(), 1);
        assert_eq!(outcome.spans_for(PiiCategory::Email).len(), 1);
        assert_eq!(outcome.spans_for(PiiCategory::Phone).len(), 0);
        assert_eq!(outcome.statistics[&PiiCategory::Email], 1);
        assert_eq!(outcome.statistics[&PiiCategory::Ssn], 0);
    }
}
