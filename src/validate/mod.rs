//! Span validation stage
//!
//! The validation stage is a mandatory, blocking step: the reconciled
//! candidate set plus the raw text go to a language-model service, which
//! returns per-candidate accept/reject verdicts with reasoning, newly
//! discovered spans the rules missed, and a natural-language explanation.
//! If the service cannot be reached the request fails; the pipeline never
//! falls back to unvalidated candidates.
//!
//! The stage is modeled as the [`SpanValidator`] capability trait so the
//! pipeline stays decoupled from any specific model vendor.

pub mod llm;

pub use llm::LlmValidator;

use crate::domain::errors::ValidatorError;
use crate::domain::span::PiiSpan;
use async_trait::async_trait;

/// A rejected candidate with the validator's reasoning
#[derive(Debug, Clone)]
pub struct Rejection {
    /// The candidate that was rejected
    pub span: PiiSpan,
    /// Why the validator considered it a false positive
    pub reason: String,
}

/// Outcome of the validation stage
#[derive(Debug, Clone)]
pub struct Validation {
    /// Candidates the validator confirmed, marked `confirmed`
    pub confirmed: Vec<PiiSpan>,
    /// Candidates the validator rejected, with reasons
    pub rejections: Vec<Rejection>,
    /// Spans the validator discovered that the rules missed; already
    /// checked against the value-fidelity invariant and marked `confirmed`
    pub discovered: Vec<PiiSpan>,
    /// Natural-language explanation of the redaction decisions
    pub explanation: String,
}

impl Validation {
    /// All confirmed spans (candidates + discoveries), unordered
    pub fn all_confirmed(self) -> Vec<PiiSpan> {
        let mut spans = self.confirmed;
        spans.extend(self.discovered);
        spans
    }
}

/// Trait for span validation implementations
///
/// The in-flight call must honor a timeout and be cancel-safe: dropping the
/// returned future aborts the underlying request without leaking the
/// connection.
#[async_trait]
pub trait SpanValidator: Send + Sync {
    /// Validate the candidate set against the source text
    async fn validate(
        &self,
        text: &str,
        candidates: &[PiiSpan],
    ) -> std::result::Result<Validation, ValidatorError>;
}
