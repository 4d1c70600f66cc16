//! Domain models and types for Veil.
//!
//! This module contains the core domain models shared across the pipeline
//! stages.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Span model** ([`PiiSpan`], [`PiiCategory`], [`SpanSource`]) with the
//!   offset invariants every stage must uphold
//! - **Request settings** ([`RedactionSettings`], [`RedactionStyle`])
//! - **Result payload** ([`RedactionOutcome`])
//! - **Error types** ([`VeilError`], [`ValidatorError`])
//! - **Result type alias** ([`Result`])
//!
//! # Offset invariants
//!
//! Spans carry half-open character offsets into the original text. A
//! finalized span set is pairwise disjoint, ordered by start offset, and
//! every span's `value` equals the text slice it covers:
//!
//! ```
//! use veil::domain::{PiiCategory, PiiSpan, SpanSource};
//!
//! let text = "Contact: jane@example.com";
//! let span = PiiSpan::new(PiiCategory::Email, "jane@example.com", 9, 25, SpanSource::Pattern);
//! assert!(span.matches_text(text));
//! ```

pub mod errors;
pub mod outcome;
pub mod result;
pub mod settings;
pub mod span;

// Re-export commonly used types for convenience
pub use errors::{ValidatorError, VeilError};
pub use outcome::RedactionOutcome;
pub use result::Result;
pub use settings::{RedactionSettings, RedactionStyle};
pub use span::{PiiCategory, PiiSpan, SpanSource};
