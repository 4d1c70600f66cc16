//! PII span data models
//!
//! A [`PiiSpan`] is a typed, positioned substring of the source text that one
//! of the detection layers identified as PII. Offsets are **character**
//! offsets (half-open) into the original text; helpers in this module convert
//! between character and byte offsets so callers can slice UTF-8 safely.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PII category enumeration
///
/// The set is extensible; these are the categories the built-in detectors
/// and the validation service exchange today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiCategory {
    /// Email addresses
    Email,
    /// Telephone numbers
    Phone,
    /// Person names (including usernames and account handles)
    Name,
    /// Physical street addresses
    Address,
    /// Social Security Numbers
    Ssn,
    /// Credit card numbers
    CreditCard,
}

impl PiiCategory {
    /// All known categories, in statistics display order
    pub const ALL: [PiiCategory; 6] = [
        PiiCategory::Email,
        PiiCategory::Phone,
        PiiCategory::Name,
        PiiCategory::Address,
        PiiCategory::Ssn,
        PiiCategory::CreditCard,
    ];

    /// Get the human-readable label used in redaction placeholders
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Name => "NAME",
            Self::Address => "ADDRESS",
            Self::Ssn => "SSN",
            Self::CreditCard => "CARD",
        }
    }

    /// Check if this category is matched by structural rules rather than an
    /// entity model. Structural matches are higher-precision and win ties
    /// during reconciliation.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Self::Ssn | Self::CreditCard | Self::Email | Self::Phone
        )
    }

    /// Reconciliation priority. Lower ranks outrank higher ones when two
    /// candidates tie on start offset and length.
    pub fn priority_rank(&self) -> u8 {
        match self {
            Self::Ssn => 0,
            Self::CreditCard => 1,
            Self::Email => 2,
            Self::Phone => 3,
            Self::Address => 4,
            Self::Name => 5,
        }
    }
}

impl fmt::Display for PiiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Name => "name",
            Self::Address => "address",
            Self::Ssn => "ssn",
            Self::CreditCard => "credit_card",
        };
        write!(f, "{name}")
    }
}

impl FromStr for PiiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" | "emails" => Ok(Self::Email),
            "phone" | "phones" => Ok(Self::Phone),
            "name" | "names" | "username" => Ok(Self::Name),
            "address" | "addresses" => Ok(Self::Address),
            "ssn" => Ok(Self::Ssn),
            "credit_card" | "credit-card" | "card" => Ok(Self::CreditCard),
            other => Err(format!("Unknown PII category: {other}")),
        }
    }
}

/// Provenance of a detected span
///
/// Retained for explanations and statistics; redaction behavior never
/// depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanSource {
    /// Structural pattern rule
    Pattern,
    /// Named-entity model
    EntityModel,
    /// Discovered by the validation service
    LlmDiscovered,
}

/// A typed, positioned PII span
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiSpan {
    /// Category of PII
    pub category: PiiCategory,
    /// Exact substring of the source text covered by the span
    pub value: String,
    /// Start character offset (inclusive) into the original text
    pub start: usize,
    /// End character offset (exclusive) into the original text
    pub end: usize,
    /// Which detection layer produced the span
    pub source: SpanSource,
    /// Set only by the validation stage; unconfirmed spans never reach the
    /// renderer
    #[serde(default)]
    pub confirmed: bool,
}

impl PiiSpan {
    /// Create a new unconfirmed span
    pub fn new(
        category: PiiCategory,
        value: impl Into<String>,
        start: usize,
        end: usize,
        source: SpanSource,
    ) -> Self {
        Self {
            category,
            value: value.into(),
            start,
            end,
            source,
            confirmed: false,
        }
    }

    /// Length of the span in characters
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span covers zero characters
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check whether two spans overlap in offset range. Adjacency
    /// (`self.end == other.start`) is not an overlap.
    pub fn overlaps(&self, other: &PiiSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Verify the value-fidelity invariant: the span's value must equal the
    /// text it claims to cover. A mismatch indicates stale offsets.
    pub fn matches_text(&self, text: &str) -> bool {
        char_slice(text, self.start, self.end).is_some_and(|slice| slice == self.value)
    }

    /// Mark the span as confirmed by the validation stage
    pub fn into_confirmed(mut self) -> Self {
        self.confirmed = true;
        self
    }
}

/// Map a character offset to the corresponding byte offset in `text`.
///
/// Returns `None` if the offset lies past the end of the text.
pub fn char_to_byte(text: &str, char_idx: usize) -> Option<usize> {
    let mut chars = 0usize;
    for (byte_idx, _) in text.char_indices() {
        if chars == char_idx {
            return Some(byte_idx);
        }
        chars += 1;
    }
    (chars == char_idx).then_some(text.len())
}

/// Map a byte offset (as produced by the regex engine) to a character offset.
///
/// The byte offset must lie on a character boundary.
pub fn byte_to_char(text: &str, byte_idx: usize) -> usize {
    text[..byte_idx].chars().count()
}

/// Slice `text` by half-open character offsets.
///
/// Returns `None` when the range is inverted or out of bounds.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let byte_start = char_to_byte(text, start)?;
    let byte_end = char_to_byte(text, end)?;
    text.get(byte_start..byte_end)
}

/// Number of characters in `text`
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(category: PiiCategory, value: &str, start: usize, end: usize) -> PiiSpan {
        PiiSpan::new(category, value, start, end, SpanSource::Pattern)
    }

    #[test]
    fn test_category_labels() {
        assert_eq!(PiiCategory::Email.label(), "EMAIL");
        assert_eq!(PiiCategory::CreditCard.label(), "CARD");
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("email".parse::<PiiCategory>().unwrap(), PiiCategory::Email);
        assert_eq!(
            "credit-card".parse::<PiiCategory>().unwrap(),
            PiiCategory::CreditCard
        );
        assert!("unknown".parse::<PiiCategory>().is_err());
    }

    #[test]
    fn test_structured_priority() {
        assert!(PiiCategory::Ssn.is_structured());
        assert!(!PiiCategory::Name.is_structured());
        assert!(PiiCategory::Ssn.priority_rank() < PiiCategory::Name.priority_rank());
    }

    #[test]
    fn test_overlap_and_adjacency() {
        let a = span(PiiCategory::Email, "a@b.co", 0, 6);
        let b = span(PiiCategory::Phone, "555", 6, 9);
        let c = span(PiiCategory::Name, "b.c", 4, 7);

        assert!(!a.overlaps(&b), "adjacent spans do not overlap");
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&a));
    }

    #[test]
    fn test_matches_text_ascii() {
        let text = "Contact: jane@example.com";
        let s = span(PiiCategory::Email, "jane@example.com", 9, 25);
        assert!(s.matches_text(text));

        let stale = span(PiiCategory::Email, "jane@example.com", 8, 24);
        assert!(!stale.matches_text(text));
    }

    #[test]
    fn test_matches_text_multibyte() {
        let text = "héllo jane@example.com fin";
        let start = byte_to_char(text, text.find("jane").unwrap());
        let s = span(PiiCategory::Email, "jane@example.com", start, start + 16);
        assert!(s.matches_text(text));
    }

    #[test]
    fn test_char_slice_bounds() {
        let text = "héllo";
        assert_eq!(char_slice(text, 0, 5), Some("héllo"));
        assert_eq!(char_slice(text, 1, 2), Some("é"));
        assert_eq!(char_slice(text, 0, 6), None);
        assert_eq!(char_slice(text, 3, 2), None);
    }

    #[test]
    fn test_char_byte_round_trip() {
        let text = "aé€b";
        for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
            assert_eq!(char_to_byte(text, char_idx), Some(byte_idx));
            assert_eq!(byte_to_char(text, byte_idx), char_idx);
        }
        assert_eq!(char_to_byte(text, 4), Some(text.len()));
        assert_eq!(char_to_byte(text, 5), None);
    }
}
