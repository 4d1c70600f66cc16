//! Candidate span detection
//!
//! Two independent detection layers run over the same text: the
//! [`PatternDetector`] matches structurally regular PII with compiled regex
//! rules, and the [`EntityDetector`] wraps a named-entity model for person
//! names. Both are pure functions of the text and their load-once
//! resources; both are intentionally over-inclusive, leaving suppression to
//! the false-positive filter and the validation stage.

pub mod entity;
pub mod ner;
pub mod pattern;
pub mod patterns;

pub use entity::EntityDetector;
pub use ner::{LexiconTagger, NerEntity, NerLabel, NerModel, NerToken};
pub use pattern::PatternDetector;
pub use patterns::{CompiledPattern, PatternRegistry};
