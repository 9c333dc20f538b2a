//! User-supplied words with optional forced tags.
//!
//! Every entry is added to the word tokenizer's dictionary. Entries that
//! carry a tag also pin that tag during decoding.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Word → optional forced tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomDictionary {
    entries: HashMap<String, Option<String>>,
}

impl CustomDictionary {
    pub fn new() -> Self {
        CustomDictionary::default()
    }

    /// Add a word, replacing any earlier entry for it
    pub fn insert(&mut self, word: &str, tag: Option<&str>) {
        let word: String = word.trim().nfc().collect();
        if word.is_empty() {
            return;
        }
        let tag = tag.map(str::trim).filter(|t| !t.is_empty()).map(String::from);
        self.entries.insert(word, tag);
    }

    /// Parse `word<TAB>TAG` lines. The tag column is optional; blank lines,
    /// lines starting with `#` and lines with an empty word are skipped.
    pub fn load_tsv(&mut self, content: &str) -> usize {
        let mut count = 0;
        for line in content.lines() {
            let line = line.trim_end();
            if line.trim_start().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let mut parts = line.split('\t');
            let Some(word) = parts.next().filter(|w| !w.trim().is_empty()) else {
                continue;
            };
            self.insert(word, parts.next());
            count += 1;
        }
        count
    }

    /// Load a TSV file
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let count = self.load_tsv(&content);
        log::info!("loaded {} custom entries from {}", count, path.display());
        Ok(count)
    }

    /// Merge `other` into this dictionary; its entries win
    pub fn extend(&mut self, other: &CustomDictionary) {
        for (word, tag) in &other.entries {
            self.entries.insert(word.clone(), tag.clone());
        }
    }

    /// The tag `word` is pinned to, if any
    pub fn forced_tag(&self, word: &str) -> Option<&str> {
        self.entries.get(word).and_then(|tag| tag.as_deref())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    /// All words, tagged or not
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<W: AsRef<str>, T: AsRef<str>> FromIterator<(W, Option<T>)> for CustomDictionary {
    fn from_iter<I: IntoIterator<Item = (W, Option<T>)>>(iter: I) -> Self {
        let mut dict = CustomDictionary::new();
        for (word, tag) in iter {
            dict.insert(word.as_ref(), tag.as_ref().map(AsRef::as_ref));
        }
        dict
    }
}
