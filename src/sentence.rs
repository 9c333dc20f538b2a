//! Sentences and the cut/merge pass that builds them.
//!
//! A tagged paragraph is first cut at every sentence-break space. Fragments
//! that open with a conjunction are then glued back onto the sentence
//! before them, since a conjunction rarely starts a sentence of its own.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::{TaggedWord, NON_SENTENCE_BREAK, SENTENCE_BREAK};
use crate::error::Result;

/// Fragments shorter than this always merge after `JSBR`
const SHORT_FRAGMENT: usize = 10;

/// `JSBR` fragments merge while the joined sentence stays below this length
const MERGED_LIMIT: usize = 50;

/// A sentence with its text and tagged words
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sentence {
    /// Text of the sentence
    pub content: String,
    /// Words and their tags, in order
    #[serde(rename = "pos")]
    pub pairs: Vec<TaggedWord>,
}

impl Sentence {
    pub fn new(content: impl Into<String>, pairs: Vec<TaggedWord>) -> Self {
        Sentence {
            content: content.into(),
            pairs,
        }
    }

    /// Sentence whose content is its words concatenated
    pub fn from_pairs(pairs: Vec<TaggedWord>) -> Self {
        let content = pairs.iter().map(|(word, _)| word.as_str()).collect();
        Sentence { content, pairs }
    }

    /// Parse the JSON form: `{"content": "...", "pos": [[word, tag], ...]}`
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to the same JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Words without their tags
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(word, _)| word.as_str())
    }

    /// Tags in word order
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(_, tag)| tag.as_str())
    }

    /// Number of tagged words
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Split tagged words at every `SBS` tag. The breaking space itself is
/// dropped; `NSBS` spaces stay in their sentence. Empty fragments are
/// skipped.
pub fn cut<W, T>(words: &[W], tags: &[T]) -> Vec<Sentence>
where
    W: AsRef<str>,
    T: AsRef<str>,
{
    let mut fragments = Vec::new();
    let mut current = Vec::new();
    for (word, tag) in words.iter().zip(tags) {
        if tag.as_ref() == SENTENCE_BREAK {
            if !current.is_empty() {
                fragments.push(Sentence::from_pairs(std::mem::take(&mut current)));
            }
        } else {
            current.push((word.as_ref().to_string(), tag.as_ref().to_string()));
        }
    }
    if !current.is_empty() {
        fragments.push(Sentence::from_pairs(current));
    }
    fragments
}

/// Attach conjunction-led fragments to the sentence before them.
///
/// `JCRG` and `JCMP` fragments always merge. A `JSBR` fragment merges if it
/// is short or the result stays short; otherwise it stands alone with the
/// conjunction (and a directly following `NSBS` space) removed. Merged
/// fragments are joined by a `(" ", NSBS)` pair.
pub fn merge(fragments: Vec<Sentence>) -> Vec<Sentence> {
    let mut merged: Vec<Sentence> = Vec::with_capacity(fragments.len());

    for fragment in fragments {
        let Some(prev) = merged.last_mut() else {
            merged.push(fragment);
            continue;
        };

        let len = fragment.len();
        let mut strip = 0;
        let join = match fragment.pairs.first().map(|(_, tag)| tag.as_str()) {
            Some("JCRG") | Some("JCMP") => true,
            Some("JSBR") if len + prev.len() < MERGED_LIMIT || len < SHORT_FRAGMENT => true,
            Some("JSBR") => {
                if len > 2 {
                    strip = if fragment.pairs[1].1 == NON_SENTENCE_BREAK {
                        2
                    } else {
                        1
                    };
                }
                false
            }
            _ => false,
        };

        if join {
            prev.content.push(' ');
            prev.content.push_str(&fragment.content);
            prev.pairs
                .push((" ".to_string(), NON_SENTENCE_BREAK.to_string()));
            prev.pairs.extend(fragment.pairs);
        } else if strip > 0 {
            merged.push(Sentence::from_pairs(fragment.pairs[strip..].to_vec()));
        } else {
            merged.push(fragment);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(items: &[(&str, &str)]) -> (Vec<String>, Vec<String>) {
        items
            .iter()
            .map(|(w, t)| (w.to_string(), t.to_string()))
            .unzip()
    }

    #[test]
    fn test_cut_at_sentence_breaks() {
        let (words, tags) = tagged(&[
            ("ฉัน", "PPRS"),
            ("กิน", "VACT"),
            (" ", "SBS"),
            ("เขา", "PPRS"),
            (" ", "NSBS"),
            ("นอน", "VACT"),
        ]);
        let sentences = cut(&words, &tags);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].content, "ฉันกิน");
        assert_eq!(sentences[1].content, "เขา นอน");
        assert_eq!(sentences[1].len(), 3);
    }

    #[test]
    fn test_cut_skips_empty_fragments() {
        let (words, tags) = tagged(&[(" ", "SBS"), ("ก", "NCMN"), (" ", "SBS"), (" ", "SBS")]);
        let sentences = cut(&words, &tags);
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].content, "ก");
    }

    #[test]
    fn test_merge_coordinating_conjunction() {
        let fragments = vec![
            Sentence::from_pairs(vec![("ฉัน".into(), "PPRS".into()), ("กิน".into(), "VACT".into())]),
            Sentence::from_pairs(vec![("และ".into(), "JCRG".into()), ("นอน".into(), "VACT".into())]),
        ];
        let merged = merge(fragments);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content, "ฉันกิน และนอน");
        assert_eq!(merged[0].len(), 5);
        assert_eq!(merged[0].pairs[2], (" ".to_string(), NON_SENTENCE_BREAK.to_string()));
    }

    #[test]
    fn test_merge_short_subordinate_clause() {
        let fragments = vec![
            Sentence::from_pairs(vec![("ฉัน".into(), "PPRS".into())]),
            Sentence::from_pairs(vec![("เพราะ".into(), "JSBR".into()), ("หิว".into(), "VATT".into())]),
        ];
        assert_eq!(merge(fragments).len(), 1);
    }

    #[test]
    fn test_long_subordinate_clause_is_stripped() {
        let long: Vec<TaggedWord> = (0..45).map(|_| ("ก".into(), "NCMN".into())).collect();
        let mut clause: Vec<TaggedWord> = vec![
            ("เพราะ".into(), "JSBR".into()),
            (" ".into(), NON_SENTENCE_BREAK.into()),
        ];
        clause.extend((0..10).map(|_| ("ข".to_string(), "NCMN".to_string())));

        let merged = merge(vec![Sentence::from_pairs(long), Sentence::from_pairs(clause)]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].len(), 10);
        assert_eq!(merged[1].content, "ข".repeat(10));
    }

    fn run(word: &str, tag: &str, count: usize) -> Vec<TaggedWord> {
        (0..count).map(|_| (word.to_string(), tag.to_string())).collect()
    }

    fn clause(conjunction: &str, tag: &str, rest: usize) -> Sentence {
        let mut pairs = vec![(conjunction.to_string(), tag.to_string())];
        pairs.extend(run("ข", "NCMN", rest));
        Sentence::from_pairs(pairs)
    }

    #[test]
    fn test_short_subordinate_clause_merges_after_long_sentence() {
        let long = Sentence::from_pairs(run("ก", "NCMN", 45));
        let merged = merge(vec![long, clause("เพราะ", "JSBR", 8)]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len(), 45 + 1 + 9);
    }

    #[test]
    fn test_subordinate_clause_length_limits() {
        // 39 + 10 stays below the merged limit
        let merged = merge(vec![
            Sentence::from_pairs(run("ก", "NCMN", 39)),
            clause("เพราะ", "JSBR", 9),
        ]);
        assert_eq!(merged.len(), 1);

        // 40 + 10 reaches it and the fragment is not short
        let merged = merge(vec![
            Sentence::from_pairs(run("ก", "NCMN", 40)),
            clause("เพราะ", "JSBR", 9),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].len(), 9);
        assert_eq!(merged[1].content, "ข".repeat(9));
    }

    #[test]
    fn test_strip_keeps_word_after_conjunction() {
        let mut pairs = vec![("เพราะ".to_string(), "JSBR".to_string())];
        pairs.push(("หิว".to_string(), "VATT".to_string()));
        pairs.extend(run("ข", "NCMN", 20));
        let merged = merge(vec![
            Sentence::from_pairs(run("ก", "NCMN", 45)),
            Sentence::from_pairs(pairs),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].pairs[0].0, "หิว");
        assert_eq!(merged[1].len(), 21);
    }

    #[test]
    fn test_two_word_subordinate_clause_is_merged_whole() {
        let merged = merge(vec![
            Sentence::from_pairs(run("ก", "NCMN", 60)),
            clause("เพราะ", "JSBR", 1),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].pairs[61].0, "เพราะ");
    }

    #[test]
    fn test_comparative_conjunction_always_merges() {
        let merged = merge(vec![
            Sentence::from_pairs(run("ก", "NCMN", 60)),
            clause("กว่า", "JCMP", 30),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].len(), 60 + 1 + 31);
        assert_eq!(merged[0].pairs[60], (" ".to_string(), NON_SENTENCE_BREAK.to_string()));
    }

    #[test]
    fn test_other_fragments_stay_apart() {
        let fragments = vec![
            Sentence::from_pairs(vec![("ก".into(), "NCMN".into())]),
            Sentence::from_pairs(vec![("ข".into(), "NCMN".into())]),
        ];
        assert_eq!(merge(fragments).len(), 2);
        assert!(merge(Vec::new()).is_empty());
    }

    #[test]
    fn test_json_round_trip_fields() {
        let sentence = Sentence::from_pairs(vec![("ไป".into(), "VACT".into())]);
        let json = sentence.to_json().unwrap();
        assert_eq!(json, r#"{"content":"ไป","pos":[["ไป","VACT"]]}"#);
        assert_eq!(Sentence::from_json(&json).unwrap(), sentence);
    }

    #[test]
    fn test_json_rejects_unknown_and_missing_fields() {
        assert!(Sentence::from_json(r#"{"content":"x","pos":[],"extra":1}"#).is_err());
        assert!(Sentence::from_json(r#"{"content":"x"}"#).is_err());
        assert!(Sentence::from_json(r#"{"pos":[]}"#).is_err());
    }

    #[test]
    fn test_display_is_content() {
        let sentence = Sentence::new("สวัสดี ครับ", Vec::new());
        assert_eq!(sentence.to_string(), "สวัสดี ครับ");
    }
}
