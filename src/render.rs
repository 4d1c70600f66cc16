//! Redaction rendering
//!
//! Rewrites the source text by replacing finalized spans with the
//! configured placeholder style. Two orderings matter and they differ:
//! label numbers are assigned per category in **left-to-right** reading
//! order, while the actual rewriting runs **right-to-left** so that a
//! replacement never invalidates the offsets of spans not yet processed.
//! All offsets are taken against the original string, never recomputed.
//!
//! Every span is re-checked against the set invariants before any text is
//! touched; a violation means an earlier stage produced stale offsets and
//! the request fails rather than redacting the wrong text.

use crate::domain::errors::VeilError;
use crate::domain::result::Result;
use crate::domain::settings::{RedactionSettings, RedactionStyle};
use crate::domain::span::{char_len, char_to_byte, PiiSpan};
use std::collections::HashMap;

/// Glyph used for black-box replacements
const BLACK_BOX_GLYPH: char = '█';

/// Render the redacted text from the finalized span set
///
/// Spans of categories disabled in `settings` are left untouched. The span
/// set must be confirmed, sorted by start offset, pairwise disjoint, and
/// value-faithful against `text`.
pub fn render(text: &str, spans: &[PiiSpan], settings: &RedactionSettings) -> Result<String> {
    let enabled: Vec<&PiiSpan> = spans
        .iter()
        .filter(|span| settings.is_enabled(span.category))
        .collect();

    verify_span_set(text, &enabled)?;

    // Label numbers follow reading order, so assign them before the
    // right-to-left rewrite pass.
    let replacements = assign_replacements(&enabled, settings);

    let mut redacted = text.to_string();
    for (span, replacement) in enabled.iter().zip(replacements.iter()).rev() {
        let byte_start = char_to_byte(text, span.start)
            .ok_or_else(|| out_of_bounds(span, text))?;
        let byte_end = char_to_byte(text, span.end)
            .ok_or_else(|| out_of_bounds(span, text))?;

        redacted.replace_range(byte_start..byte_end, replacement);
    }

    Ok(redacted)
}

/// Check the finalized-set invariants before touching any text
fn verify_span_set(text: &str, spans: &[&PiiSpan]) -> Result<()> {
    let total = char_len(text);

    for span in spans {
        if !span.confirmed {
            return Err(VeilError::Rendering(format!(
                "Unconfirmed {} span at {}..{} reached the renderer",
                span.category, span.start, span.end
            )));
        }
        if span.start >= span.end || span.end > total {
            return Err(out_of_bounds(span, text));
        }
        if !span.matches_text(text) {
            return Err(VeilError::Rendering(format!(
                "Stale offsets: {} span at {}..{} no longer matches its value",
                span.category, span.start, span.end
            )));
        }
    }

    for pair in spans.windows(2) {
        if pair[0].start > pair[1].start {
            return Err(VeilError::Rendering(
                "Span set is not ordered by start offset".to_string(),
            ));
        }
        if pair[0].overlaps(pair[1]) {
            return Err(VeilError::Rendering(format!(
                "Overlapping spans reached the renderer: {}..{} and {}..{}",
                pair[0].start, pair[0].end, pair[1].start, pair[1].end
            )));
        }
    }

    Ok(())
}

fn out_of_bounds(span: &PiiSpan, text: &str) -> VeilError {
    VeilError::Rendering(format!(
        "Span offsets {}..{} out of bounds for text of {} characters",
        span.start,
        span.end,
        char_len(text)
    ))
}

/// Build replacement strings in reading order
fn assign_replacements(spans: &[&PiiSpan], settings: &RedactionSettings) -> Vec<String> {
    let mut counters: HashMap<&'static str, usize> = HashMap::new();

    spans
        .iter()
        .map(|span| match settings.style {
            RedactionStyle::Labels => {
                let counter = counters.entry(span.category.label()).or_insert(0);
                *counter += 1;
                format!("[{}_{}]", span.category.label(), counter)
            }
            // Sized to the original span so the replacement is never
            // longer; the length itself was already observable.
            RedactionStyle::BlackBoxes => {
                BLACK_BOX_GLYPH.to_string().repeat(span.len())
            }
            RedactionStyle::Custom => settings
                .custom_label
                .clone()
                .unwrap_or_else(|| "[REDACTED]".to_string()),
        })
        .collect()
}
