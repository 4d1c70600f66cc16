//! Entity detector
//!
//! Wraps a [`NerModel`] and converts its token-level output into candidate
//! [`PiiSpan`]s with exact character offsets. The model reports entities as
//! token groups with byte offsets; this detector slices values directly from
//! the source string (token text is never re-joined, so punctuation and
//! spacing inside an entity survive verbatim) and merges adjacent person
//! entities that the model split apart.

use crate::detect::ner::{LexiconTagger, NerLabel, NerModel};
use crate::domain::result::Result;
use crate::domain::span::{byte_to_char, char_slice, PiiCategory, PiiSpan, SpanSource};
use std::sync::Arc;

/// Maximum character gap between two person entities that still reads as
/// first + last name
const NAME_MERGE_GAP: usize = 5;

/// Named-entity detector producing name (and optionally address) candidates
pub struct EntityDetector {
    model: Arc<dyn NerModel>,
}

impl EntityDetector {
    /// Create a detector over the bundled lexical tagger
    pub fn new() -> Result<Self> {
        Ok(Self {
            model: Arc::new(LexiconTagger::new()?),
        })
    }

    /// Create a detector over a custom model
    pub fn with_model(model: Arc<dyn NerModel>) -> Self {
        Self { model }
    }

    /// Detect entity candidate spans in the text
    ///
    /// Only the name and address categories are ever emitted here.
    pub fn detect(&self, text: &str) -> Result<Vec<PiiSpan>> {
        let entities = self.model.tag(text)?;

        let mut spans: Vec<PiiSpan> = Vec::new();
        for entity in entities {
            let (Some(first), Some(last)) = (entity.tokens.first(), entity.tokens.last()) else {
                continue;
            };

            // Token boundary reconciliation: byte offsets from the model
            // become character offsets against the source string.
            let start = byte_to_char(text, first.start);
            let end = byte_to_char(text, last.end);
            let Some(value) = char_slice(text, start, end) else {
                continue;
            };

            // Very short fragments are almost always tokenizer noise
            if value.trim().chars().count() < 2 {
                continue;
            }

            let category = match entity.label {
                NerLabel::Person => PiiCategory::Name,
                NerLabel::Location => PiiCategory::Address,
            };

            spans.push(PiiSpan::new(
                category,
                value,
                start,
                end,
                SpanSource::EntityModel,
            ));
        }

        spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
        Ok(Self::merge_adjacent_names(text, spans))
    }

    /// Merge name spans separated by at most [`NAME_MERGE_GAP`] characters,
    /// so a split "Emily" + "Johnson" becomes one "Emily Johnson" span.
    fn merge_adjacent_names(text: &str, spans: Vec<PiiSpan>) -> Vec<PiiSpan> {
        let mut merged: Vec<PiiSpan> = Vec::with_capacity(spans.len());

        for span in spans {
            let joined = match merged.last() {
                Some(prev)
                    if prev.category == PiiCategory::Name
                        && span.category == PiiCategory::Name
                        && span.start >= prev.end
                        && span.start - prev.end <= NAME_MERGE_GAP =>
                {
                    char_slice(text, prev.start, span.end).map(str::to_string)
                }
                _ => None,
            };

            match joined {
                Some(value) => {
                    let prev = merged.last_mut().expect("checked above");
                    prev.end = span.end;
                    prev.value = value;
                }
                None => merged.push(span),
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ner::{NerEntity, NerToken};
    use crate::domain::errors::VeilError;

    /// Fixed-output model for exercising the reconciliation logic
    struct FixedModel {
        entities: Vec<NerEntity>,
    }

    impl NerModel for FixedModel {
        fn tag(&self, _text: &str) -> Result<Vec<NerEntity>> {
            Ok(self.entities.clone())
        }
    }

    struct FailingModel;

    impl NerModel for FailingModel {
        fn tag(&self, _text: &str) -> Result<Vec<NerEntity>> {
            Err(VeilError::Detection("model unavailable".to_string()))
        }
    }

    fn person(tokens: Vec<NerToken>) -> NerEntity {
        NerEntity {
            label: NerLabel::Person,
            tokens,
        }
    }

    #[test]
    fn test_detect_with_bundled_model() {
        let detector = EntityDetector::new().unwrap();
        let text = "Please contact Emily Johnson about the invoice.";
        let spans = detector.detect(text).unwrap();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].category, PiiCategory::Name);
        assert_eq!(spans[0].value, "Emily Johnson");
        assert!(spans[0].matches_text(text));
        assert_eq!(spans[0].source, SpanSource::EntityModel);
    }

    #[test]
    fn test_token_offsets_reconciled_to_characters() {
        // Multibyte char before the entity shifts byte offsets away from
        // character offsets
        let text = "café guest Émile Zola left";
        let byte_start = text.find("Émile").unwrap();
        let model = FixedModel {
            entities: vec![person(vec![
                NerToken {
                    start: byte_start,
                    end: byte_start + "Émile".len(),
                },
                NerToken {
                    start: text.find("Zola").unwrap(),
                    end: text.find("Zola").unwrap() + 4,
                },
            ])],
        };

        let detector = EntityDetector::with_model(Arc::new(model));
        let spans = detector.detect(text).unwrap();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].value, "Émile Zola");
        assert!(spans[0].matches_text(text));
    }

    #[test]
    fn test_adjacent_entities_merged() {
        let text = "met Emily Johnson there";
        let model = FixedModel {
            entities: vec![
                person(vec![NerToken { start: 4, end: 9 }]),
                person(vec![NerToken { start: 10, end: 17 }]),
            ],
        };

        let detector = EntityDetector::with_model(Arc::new(model));
        let spans = detector.detect(text).unwrap();

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].value, "Emily Johnson");
    }

    #[test]
    fn test_distant_entities_not_merged() {
        let text = "Emily wrote the summary and Johnson reviewed it";
        let model = FixedModel {
            entities: vec![
                person(vec![NerToken { start: 0, end: 5 }]),
                person(vec![NerToken { start: 28, end: 35 }]),
            ],
        };

        let detector = EntityDetector::with_model(Arc::new(model));
        let spans = detector.detect(text).unwrap();

        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn test_short_fragments_dropped() {
        let text = "A b c";
        let model = FixedModel {
            entities: vec![person(vec![NerToken { start: 0, end: 1 }])],
        };

        let detector = EntityDetector::with_model(Arc::new(model));
        let spans = detector.detect(text).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_model_failure_is_fatal() {
        let detector = EntityDetector::with_model(Arc::new(FailingModel));
        let result = detector.detect("any text");
        assert!(matches!(result, Err(VeilError::Detection(_))));
    }
}
