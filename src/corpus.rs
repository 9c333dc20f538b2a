//! Statistical language model built from a POS-tagged corpus.
//!
//! The corpus uses the ORCHID layout: a `%TTitle` header opens a book, `#P`
//! lines open paragraphs, `#n` lines open sentences, the raw sentence text
//! ends with `//`, then one `word/TAG` pair per line until a closing `//`.
//! Sentences of a paragraph are chained with a sentence-break space tag so
//! the model learns where sentences end.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::viterbi::HiddenMarkovModel;

/// Tag of a space that ends a sentence
pub const SENTENCE_BREAK: &str = "SBS";

/// Tag of a space inside a sentence
pub const NON_SENTENCE_BREAK: &str = "NSBS";

/// Corpus token standing for an explicit space
pub const SPACE_TOKEN: &str = "<space>";

/// Common-noun tag used when nothing better is known about a word
pub const FALLBACK_TAG: &str = "NCMN";

/// A word and its part-of-speech tag
pub type TaggedWord = (String, String);

/// Vocabulary key whose only emission is `tag` itself.
///
/// Feeding this key to the decoder forces `tag` at that position.
pub fn forced_tag_key(tag: &str) -> String {
    format!("_{}", tag)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Init,
    Book,
    Paragraph,
    Sentence,
    English,
    Word,
}

/// Parse ORCHID-formatted text into paragraphs of sentences of tagged words.
pub fn parse_corpus(content: &str) -> Result<Vec<Vec<Vec<TaggedWord>>>> {
    let mut paragraphs = Vec::new();
    let mut sentences: Vec<Vec<TaggedWord>> = Vec::new();
    let mut words: Vec<TaggedWord> = Vec::new();
    let mut state = State::Init;

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        state = match state {
            State::Init if line.starts_with("%TTitle") => State::Book,
            State::Init if line.starts_with("#P") => State::Paragraph,
            State::Init if line.starts_with('#') => State::Sentence,
            State::Init => State::Init,
            State::Book if line.starts_with("#P") => State::Paragraph,
            State::Book => State::Book,
            // the line after a paragraph marker is the sentence number
            State::Paragraph => {
                if !sentences.is_empty() {
                    paragraphs.push(std::mem::take(&mut sentences));
                }
                State::Sentence
            }
            State::Sentence if line.contains("//") => {
                if line.starts_with("%E") {
                    State::Init
                } else {
                    words.clear();
                    State::Word
                }
            }
            State::Sentence if line.starts_with("%E") => State::English,
            State::Sentence => State::Sentence,
            State::English if line.contains("//") => State::Init,
            State::English => State::English,
            State::Word if line.contains("//") => {
                sentences.push(std::mem::take(&mut words));
                State::Init
            }
            State::Word => {
                words.push(parse_pair(line).ok_or_else(|| Error::MalformedCorpus {
                    line: idx + 1,
                    content: line.to_string(),
                })?);
                State::Word
            }
        };
    }

    if !sentences.is_empty() {
        paragraphs.push(sentences);
    }
    Ok(paragraphs)
}

/// Split a `word/TAG` line; the word is stored in NFC like dictionary entries.
fn parse_pair(line: &str) -> Option<TaggedWord> {
    let (word, tag) = line.rsplit_once('/')?;
    if word.is_empty() || tag.is_empty() {
        return None;
    }
    Some((word.nfc().collect(), tag.to_string()))
}

/// Initial, transition and emission tables over the corpus tag set.
///
/// Built once and immutable afterwards. Tags are kept in sorted order, which
/// is also the tie-break order of the decoder.
#[derive(Debug, Clone, Default)]
pub struct CorpusModel {
    sentences: Vec<Vec<TaggedWord>>,
    paragraphs: Vec<Vec<TaggedWord>>,
    vocabulary: HashSet<String>,
    tags: Vec<String>,
    tag_index: HashMap<String, usize>,
    initial: Vec<f64>,
    bigram: Vec<f64>,
    trigram: Vec<f64>,
    emission: HashMap<String, Vec<f64>>,
}

impl CorpusModel {
    /// A model without tags or vocabulary
    pub fn empty() -> Self {
        CorpusModel::default()
    }

    /// Parse corpus text and derive the model
    pub fn parse(content: &str) -> Result<Self> {
        Ok(Self::from_paragraphs(parse_corpus(content)?))
    }

    /// Load a corpus file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let model = Self::parse(&content)?;
        log::info!(
            "corpus {}: {} paragraphs, {} words, {} tags",
            path.display(),
            model.paragraphs.len(),
            model.vocabulary.len(),
            model.tags.len()
        );
        Ok(model)
    }

    /// Derive the model from already parsed paragraphs
    pub fn from_paragraphs(corpus: Vec<Vec<Vec<TaggedWord>>>) -> Self {
        let mut vocabulary = HashSet::new();
        let mut tag_set = BTreeSet::new();
        for (word, tag) in corpus.iter().flatten().flatten() {
            vocabulary.insert(word.clone());
            tag_set.insert(tag.clone());
        }
        if tag_set.is_empty() {
            return Self::empty();
        }
        tag_set.insert(SENTENCE_BREAK.to_string());
        tag_set.insert(NON_SENTENCE_BREAK.to_string());

        let tags: Vec<String> = tag_set.into_iter().collect();
        let tag_index: HashMap<String, usize> = tags
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let paragraphs: Vec<Vec<TaggedWord>> = corpus
            .iter()
            .map(|paragraph| with_space_tags(paragraph))
            .filter(|p| !p.is_empty())
            .collect();
        let sentences: Vec<Vec<TaggedWord>> = corpus.into_iter().flatten().collect();

        let n = tags.len();
        let ids: Vec<Vec<usize>> = paragraphs
            .iter()
            .map(|p| p.iter().map(|(_, tag)| tag_index[tag]).collect())
            .collect();

        let mut initial = vec![0.0; n];
        for seq in &ids {
            initial[seq[0]] += 1.0;
        }
        let count = ids.len() as f64;
        for p in initial.iter_mut() {
            *p /= count;
        }

        let mut bigram = vec![0.0; n * n];
        for seq in &ids {
            for pair in seq.windows(2) {
                bigram[pair[0] * n + pair[1]] += 1.0;
            }
        }
        normalize_rows(&mut bigram, n);

        let mut trigram = vec![0.0; n * n * n];
        for seq in &ids {
            for triple in seq.windows(3) {
                trigram[(triple[0] * n + triple[1]) * n + triple[2]] += 1.0;
            }
        }
        normalize_rows(&mut trigram, n);

        let mut tag_count = vec![0.0; n];
        let mut emission: HashMap<String, Vec<f64>> = HashMap::new();
        for (word, tag) in paragraphs.iter().flatten() {
            let id = tag_index[tag];
            tag_count[id] += 1.0;
            emission.entry(word.clone()).or_insert_with(|| vec![0.0; n])[id] += 1.0;
        }
        for row in emission.values_mut() {
            for (p, &total) in row.iter_mut().zip(&tag_count) {
                if total > 0.0 {
                    *p /= total;
                }
            }
        }
        for (id, tag) in tags.iter().enumerate() {
            let mut row = vec![0.0; n];
            row[id] = 1.0;
            emission.insert(forced_tag_key(tag), row);
        }

        CorpusModel {
            sentences,
            paragraphs,
            vocabulary,
            tags,
            tag_index,
            initial,
            bigram,
            trigram,
            emission,
        }
    }

    /// True when the model has no tags
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// All tags in enumeration order, including `SBS` and `NSBS`
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Position of `tag` in [`tags`](Self::tags)
    pub fn tag_id(&self, tag: &str) -> Option<usize> {
        self.tag_index.get(tag).copied()
    }

    /// Whether `word` occurs in the corpus
    pub fn exists(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    /// Corpus words
    pub fn vocabulary(&self) -> &HashSet<String> {
        &self.vocabulary
    }

    /// Tagged sentences as they appear in the corpus
    pub fn sentences(&self) -> &[Vec<TaggedWord>] {
        &self.sentences
    }

    /// Paragraph tag sequences the model was trained on
    pub fn paragraphs(&self) -> &[Vec<TaggedWord>] {
        &self.paragraphs
    }

    /// P(first tag of a paragraph = `tag`)
    pub fn initial(&self, tag: &str) -> f64 {
        self.tag_id(tag).map_or(0.0, |t| self.initial[t])
    }

    /// P(`next` | `prev`)
    pub fn bigram(&self, prev: &str, next: &str) -> f64 {
        match (self.tag_id(prev), self.tag_id(next)) {
            (Some(p), Some(s)) => self.bigram_transition(p, s),
            _ => 0.0,
        }
    }

    /// P(`next` | `prev2`, `prev1`)
    pub fn trigram(&self, prev2: &str, prev1: &str, next: &str) -> f64 {
        match (self.tag_id(prev2), self.tag_id(prev1), self.tag_id(next)) {
            (Some(p2), Some(p1), Some(s)) => self.trigram_transition(p2, p1, s),
            _ => 0.0,
        }
    }

    /// count(`word`, `tag`) / count(`tag`)
    pub fn emission(&self, word: &str, tag: &str) -> f64 {
        match (self.emission.get(word), self.tag_id(tag)) {
            (Some(row), Some(t)) => row[t],
            _ => 0.0,
        }
    }
}

impl HiddenMarkovModel for CorpusModel {
    fn num_states(&self) -> usize {
        self.tags.len()
    }

    fn initial(&self, state: usize) -> f64 {
        self.initial[state]
    }

    fn bigram_transition(&self, prev: usize, state: usize) -> f64 {
        self.bigram[prev * self.tags.len() + state]
    }

    fn trigram_transition(&self, prev2: usize, prev1: usize, state: usize) -> f64 {
        let n = self.tags.len();
        self.trigram[(prev2 * n + prev1) * n + state]
    }

    fn emission_row(&self, observation: &str) -> Option<&[f64]> {
        self.emission.get(observation).map(Vec::as_slice)
    }
}

/// Flatten a paragraph, tagging corpus spaces `NSBS` and inserting an
/// `SBS` space between sentences.
fn with_space_tags(paragraph: &[Vec<TaggedWord>]) -> Vec<TaggedWord> {
    let mut seq = Vec::new();
    for (i, sentence) in paragraph.iter().enumerate() {
        for (word, tag) in sentence {
            if word == SPACE_TOKEN {
                seq.push((SPACE_TOKEN.to_string(), NON_SENTENCE_BREAK.to_string()));
            } else {
                seq.push((word.clone(), tag.clone()));
            }
        }
        if i + 1 != paragraph.len() {
            seq.push((SPACE_TOKEN.to_string(), SENTENCE_BREAK.to_string()));
        }
    }
    seq
}

/// Normalize consecutive rows of width `n`; unobserved rows stay zero.
fn normalize_rows(table: &mut [f64], n: usize) {
    for row in table.chunks_mut(n) {
        let total: f64 = row.iter().sum();
        if total > 0.0 {
            for p in row.iter_mut() {
                *p /= total;
            }
        }
    }
}
