//! Mapping tokens to decoder observations and decoded tags back to tokens.
//!
//! Words the corpus never saw would give the decoder nothing to work with.
//! They are split with the sub-word tokenizer first; if that does not help,
//! a stand-in observation is used. Each input token remembers which
//! observations it produced so the tags can be folded back afterwards.

use std::ops::Range;

use crate::corpus::{forced_tag_key, CorpusModel, FALLBACK_TAG};
use crate::custom_dictionary::CustomDictionary;
use crate::tokenizer::LongestMatchTokenizer;

/// Noun tags; a split word containing any of them becomes a proper noun
pub const NOUN_TAGS: &[&str] = &["NPRP", "NCNM", "NONM", "NLBL", "NCMN", "NTTL"];

/// Tag given to split words with a noun part
pub const PROPER_NOUN_TAG: &str = "NPRP";

/// Observation stream for one paragraph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Tokens after expansion, one per observation
    pub tokens: Vec<String>,
    /// Emission lookup keys fed to the decoder
    pub observations: Vec<String>,
    /// Observations produced by each input token
    pub ranges: Vec<Range<usize>>,
    /// Forced tag of each input token
    pub forced: Vec<Option<String>>,
}

impl Resolution {
    /// Fold one tag per observation back to one tag per input token.
    ///
    /// A forced tag always wins. A token split into several sub-words
    /// becomes [`PROPER_NOUN_TAG`] if any sub-word got a noun tag, and takes
    /// the first sub-word's tag otherwise.
    pub fn invert(&self, tags: &[String]) -> Vec<String> {
        self.ranges
            .iter()
            .zip(&self.forced)
            .map(|(range, forced)| {
                if let Some(tag) = forced {
                    return tag.clone();
                }
                let parts = &tags[range.clone()];
                if parts.len() > 1 && parts.iter().any(|t| NOUN_TAGS.contains(&t.as_str())) {
                    PROPER_NOUN_TAG.to_string()
                } else {
                    parts[0].clone()
                }
            })
            .collect()
    }
}

/// Builds [`Resolution`]s against one model
pub struct Resolver<'a> {
    model: &'a CorpusModel,
    subwords: &'a LongestMatchTokenizer,
    custom: &'a CustomDictionary,
}

impl<'a> Resolver<'a> {
    pub fn new(
        model: &'a CorpusModel,
        subwords: &'a LongestMatchTokenizer,
        custom: &'a CustomDictionary,
    ) -> Self {
        Resolver {
            model,
            subwords,
            custom,
        }
    }

    /// Resolve a token stream
    pub fn resolve<S: AsRef<str>>(&self, words: &[S]) -> Resolution {
        let mut resolution = Resolution::default();

        for word in words {
            let word = word.as_ref();
            let start = resolution.observations.len();
            let mut forced = None;

            if let Some(tag) = self.custom.forced_tag(word) {
                resolution.tokens.push(word.to_string());
                resolution.observations.push(forced_tag_key(tag));
                forced = Some(tag.to_string());
            } else if self.model.exists(word) {
                resolution.tokens.push(word.to_string());
                resolution.observations.push(word.to_string());
            } else {
                let parts = self.subwords.words(word);
                let known = parts.iter().take_while(|p| self.model.exists(p)).count();
                if !parts.is_empty() && known == parts.len() {
                    resolution.tokens.extend(parts.iter().cloned());
                    resolution.observations.extend(parts);
                } else if known > 0 {
                    resolution.tokens.push(word.to_string());
                    resolution.observations.push(parts[0].clone());
                } else {
                    resolution.tokens.push(word.to_string());
                    resolution.observations.push(forced_tag_key(FALLBACK_TAG));
                }
            }

            resolution.ranges.push(start..resolution.observations.len());
            resolution.forced.push(forced);
        }
        resolution
    }
}
