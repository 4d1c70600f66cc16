//! Named-entity model interface and the bundled lexical tagger
//!
//! The entity detector is decoupled from any particular model through the
//! [`NerModel`] trait: a model consumes raw text and returns entities as
//! groups of tokens, where each token carries its exact byte offsets into
//! the source. Offset reconciliation back to character positions happens in
//! the entity detector, not in the model.
//!
//! The bundled [`LexiconTagger`] is a deterministic rule model: a
//! whitespace/punctuation tokenizer feeds a tagger driven by a given-name
//! gazetteer, honorific cues, and capitalization sequences. It loads its
//! resources once and is safe for concurrent read-only use.

use crate::domain::errors::VeilError;
use crate::domain::result::Result;
use std::collections::HashSet;
use std::path::Path;

/// Entity label emitted by a model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NerLabel {
    /// Person name
    Person,
    /// Geographic location
    Location,
}

/// A model token with byte offsets into the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NerToken {
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

/// A tagged entity: one or more consecutive tokens sharing a label
#[derive(Debug, Clone)]
pub struct NerEntity {
    /// Entity label
    pub label: NerLabel,
    /// Tokens covered by the entity, in source order
    pub tokens: Vec<NerToken>,
}

/// Trait for named-entity model implementations
///
/// Implementations must be safe for concurrent read-only use; the engine
/// loads one model at startup and shares it across requests.
pub trait NerModel: Send + Sync {
    /// Tag entities in the text. Token offsets must be exact byte offsets
    /// into `text`.
    fn tag(&self, text: &str) -> Result<Vec<NerEntity>>;
}

/// Honorifics that introduce a person name
const HONORIFICS: &[&str] = &["mr", "mrs", "ms", "mx", "miss", "dr", "prof", "rev", "sir"];

/// Capitalized words the tagger never treats as name parts
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "i", "we", "you", "he", "she", "it", "they", "my", "our", "your", "his",
    "her", "their", "this", "that", "these", "those", "if", "and", "or", "but", "not", "dear",
    "hello", "hi", "thanks", "sincerely", "regards", "monday", "tuesday", "wednesday", "thursday",
    "friday", "saturday", "sunday", "january", "february", "march", "april", "may", "june", "july",
    "august", "september", "october", "november", "december",
];

/// Tokenized word with byte offsets
#[derive(Debug, Clone, Copy)]
struct Word<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

impl Word<'_> {
    fn is_capitalized(&self) -> bool {
        self.text
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase())
    }
}

/// Deterministic lexicon-and-rules tagger
///
/// Emits [`NerLabel::Person`] entities only; location tagging is left to
/// models with real geographic knowledge.
pub struct LexiconTagger {
    given_names: HashSet<String>,
}

impl LexiconTagger {
    /// Create a tagger over the embedded gazetteer
    pub fn new() -> Result<Self> {
        Self::from_gazetteer(include_str!("../../patterns/given_names.txt"))
    }

    /// Create a tagger from a gazetteer file (one lowercase name per line)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            VeilError::Detection(format!(
                "Failed to load name gazetteer {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_gazetteer(&content)
    }

    /// Create a tagger from gazetteer content
    pub fn from_gazetteer(content: &str) -> Result<Self> {
        let given_names: HashSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.to_lowercase())
            .collect();

        if given_names.is_empty() {
            return Err(VeilError::Detection(
                "Name gazetteer is empty; entity model unavailable".to_string(),
            ));
        }

        Ok(Self { given_names })
    }

    fn is_given_name(&self, word: &Word<'_>) -> bool {
        word.is_capitalized() && self.given_names.contains(&word.text.to_lowercase())
    }

    fn is_stopword(word: &Word<'_>) -> bool {
        STOPWORDS.contains(&word.text.to_lowercase().as_str())
    }

    fn is_honorific(word: &Word<'_>) -> bool {
        HONORIFICS.contains(&word.text.to_lowercase().as_str())
    }

    /// A word opens a sentence when only whitespace or a terminator
    /// precedes it.
    fn is_sentence_initial(text: &str, word: &Word<'_>) -> bool {
        text[..word.start]
            .chars()
            .rev()
            .find(|c| !c.is_whitespace())
            .map_or(true, |c| matches!(c, '.' | '!' | '?' | ':' | ';'))
    }

    /// A plausible surname continuation: capitalized, not a stopword, and
    /// separated from the previous word by at most two characters.
    fn continues_name(text: &str, prev: &Word<'_>, word: &Word<'_>) -> bool {
        word.is_capitalized() && !Self::is_stopword(word) && word.start - prev.end <= 2 && {
            // Only whitespace between the two words
            text[prev.end..word.start].chars().all(char::is_whitespace)
        }
    }
}

impl NerModel for LexiconTagger {
    fn tag(&self, text: &str) -> Result<Vec<NerEntity>> {
        let words = tokenize(text);
        let mut person = vec![false; words.len()];

        for i in 0..words.len() {
            let word = &words[i];

            // Honorific cue: tag the following capitalized run. The gap may
            // contain the honorific's period ("Dr. Alvarez").
            if Self::is_honorific(word) {
                if let Some(next) = words.get(i + 1) {
                    let gap = &text[word.end..next.start];
                    let gap_ok = next.start - word.end <= 2
                        && gap.chars().all(|c| c == '.' || c.is_whitespace());
                    if gap_ok && next.is_capitalized() && !Self::is_stopword(next) {
                        person[i + 1] = true;
                        let mut j = i + 2;
                        let mut taken = 0;
                        while j < words.len()
                            && taken < 2
                            && Self::continues_name(text, &words[j - 1], &words[j])
                        {
                            person[j] = true;
                            j += 1;
                            taken += 1;
                        }
                    }
                }
                continue;
            }

            // Gazetteer hit: tag the given name and up to two surname words
            if self.is_given_name(word) {
                person[i] = true;
                let mut j = i + 1;
                let mut taken = 0;
                while j < words.len()
                    && taken < 2
                    && Self::continues_name(text, &words[j - 1], &words[j])
                {
                    person[j] = true;
                    j += 1;
                    taken += 1;
                }
            }

            // Mid-sentence capitalized pair, e.g. an uncommon first name
            // followed by a surname
            if i + 1 < words.len()
                && word.is_capitalized()
                && !Self::is_stopword(word)
                && !Self::is_sentence_initial(text, word)
                && Self::continues_name(text, word, &words[i + 1])
            {
                person[i] = true;
                person[i + 1] = true;
            }
        }

        // Group consecutive tagged words into entities. A comma or any
        // non-whitespace gap closes the current entity so list items are
        // not fused together.
        let mut entities = Vec::new();
        let mut current: Vec<NerToken> = Vec::new();
        for (i, word) in words.iter().enumerate() {
            if person[i] {
                let joins_previous = current.last().is_some_and(|prev: &NerToken| {
                    word.start - prev.end <= 2
                        && text[prev.end..word.start].chars().all(char::is_whitespace)
                });
                if !current.is_empty() && !joins_previous {
                    entities.push(NerEntity {
                        label: NerLabel::Person,
                        tokens: std::mem::take(&mut current),
                    });
                }
                current.push(NerToken {
                    start: word.start,
                    end: word.end,
                });
            } else if !current.is_empty() {
                entities.push(NerEntity {
                    label: NerLabel::Person,
                    tokens: std::mem::take(&mut current),
                });
            }
        }
        if !current.is_empty() {
            entities.push(NerEntity {
                label: NerLabel::Person,
                tokens: current,
            });
        }

        Ok(entities)
    }
}

/// Split text into alphabetic words, keeping internal apostrophes and
/// hyphens ("O'Brien", "Smith-Jones"). Offsets are byte offsets.
fn tokenize(text: &str) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !c.is_alphabetic() {
            continue;
        }

        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            let is_joiner = matches!(next, '\'' | '-')
                && text[idx + next.len_utf8()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_alphabetic());
            if next.is_alphabetic() || is_joiner {
                end = idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        words.push(Word {
            text: &text[start..end],
            start,
            end,
        });
    }

    words
}
