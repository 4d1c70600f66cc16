//! Span reconciliation
//!
//! Merges the filtered candidate sets from the detection layers into one
//! ordered, non-overlapping set. Candidates are sorted by start offset
//! ascending, then span length descending (the most complete match wins),
//! then by category priority: structural pattern categories (ssn,
//! credit_card, email, phone) outrank entity-derived ones (address, name)
//! because structural matches are higher-precision. A left-to-right sweep
//! with a last-accepted-end cursor drops every candidate overlapping an
//! already-accepted span.

use crate::domain::span::PiiSpan;
use std::cmp::Ordering;

/// Reconcile candidate spans into a disjoint, ordered set
///
/// The output is still unconfirmed; the validation stage decides which
/// spans survive. Adjacent spans (one ending where the next starts) are
/// both kept.
pub fn reconcile(mut candidates: Vec<PiiSpan>) -> Vec<PiiSpan> {
    candidates.sort_by(compare_priority);

    let mut accepted: Vec<PiiSpan> = Vec::with_capacity(candidates.len());
    let mut cursor = 0usize;

    for span in candidates {
        if span.is_empty() {
            continue;
        }
        if accepted.is_empty() || span.start >= cursor {
            cursor = span.end;
            accepted.push(span);
        } else {
            tracing::trace!(
                category = %span.category,
                start = span.start,
                end = span.end,
                "Dropped overlapping candidate"
            );
        }
    }

    accepted
}

/// Ordering used by the reconciliation sweep
fn compare_priority(a: &PiiSpan, b: &PiiSpan) -> Ordering {
    a.start
        .cmp(&b.start)
        .then(b.len().cmp(&a.len()))
        .then(a.category.priority_rank().cmp(&b.category.priority_rank()))
}
