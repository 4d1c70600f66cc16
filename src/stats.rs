//! Per-category statistics
//!
//! Counts finalized spans per category. Every known category appears in the
//! output, zero counts included; spans of disabled categories contribute
//! nothing. Pure function, no side effects.

use crate::domain::settings::RedactionSettings;
use crate::domain::span::{PiiCategory, PiiSpan};
use std::collections::BTreeMap;

/// Count finalized spans per category
pub fn aggregate(
    spans: &[PiiSpan],
    settings: &RedactionSettings,
) -> BTreeMap<PiiCategory, usize> {
    let mut counts: BTreeMap<PiiCategory, usize> =
        PiiCategory::ALL.into_iter().map(|c| (c, 0)).collect();

    for span in spans {
        if settings.is_enabled(span.category) {
            if let Some(count) = counts.get_mut(&span.category) {
                *count += 1;
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::RedactionStyle;
    use crate::domain::span::SpanSource;

    fn span(category: PiiCategory) -> PiiSpan {
        PiiSpan::new(category, "v", 0, 1, SpanSource::Pattern).into_confirmed()
    }

    #[test]
    fn test_zero_counts_present() {
        let settings = RedactionSettings::all_categories(RedactionStyle::Labels);
        let counts = aggregate(&[], &settings);

        assert_eq!(counts.len(), PiiCategory::ALL.len());
        assert!(counts.values().all(|&c| c == 0));
    }

    #[test]
    fn test_counts_by_category() {
        let settings = RedactionSettings::all_categories(RedactionStyle::Labels);
        let spans = vec![
            span(PiiCategory::Email),
            span(PiiCategory::Email),
            span(PiiCategory::Phone),
        ];

        let counts = aggregate(&spans, &settings);
        assert_eq!(counts[&PiiCategory::Email], 2);
        assert_eq!(counts[&PiiCategory::Phone], 1);
        assert_eq!(counts[&PiiCategory::Ssn], 0);
    }

    #[test]
    fn test_disabled_category_counts_zero() {
        let settings = RedactionSettings::new([PiiCategory::Email], RedactionStyle::Labels);
        let spans = vec![span(PiiCategory::Email), span(PiiCategory::Phone)];

        let counts = aggregate(&spans, &settings);
        assert_eq!(counts[&PiiCategory::Email], 1);
        assert_eq!(counts[&PiiCategory::Phone], 0);
    }
}
