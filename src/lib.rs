//! # thai-segmenter
//!
//! Thai word tokenization, part-of-speech tagging and sentence segmentation.
//!
//! Words are found with a dictionary longest-match tokenizer. Tags come from
//! a hidden Markov model trained on an ORCHID-style tagged corpus, in which
//! spaces carry a sentence-break (`SBS`) or non-break (`NSBS`) tag. Sentences
//! are cut at sentence-break spaces and fragments starting with a
//! conjunction are merged back.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use thai_segmenter::{CorpusModel, LongestMatchTokenizer, Segmenter, TrieBuilder};
//!
//! let corpus = "#P1\n#1\nx//\nฉัน/PPRS\nกิน/VACT\nข้าว/NCMN\n//\n";
//! let model = CorpusModel::parse(corpus)?;
//!
//! let mut builder = TrieBuilder::new();
//! builder.load_lines("ฉัน\nกิน\nข้าว\n");
//! let words = LongestMatchTokenizer::new(builder.build());
//!
//! let segmenter = Segmenter::new(words.clone(), words, Arc::new(model));
//! assert_eq!(segmenter.tokenize("ฉันกินข้าว"), vec!["ฉัน", "กิน", "ข้าว"]);
//!
//! for sentence in segmenter.segment_sentences("ฉันกินข้าว") {
//!     println!("{}", sentence);
//! }
//! # Ok::<(), thai_segmenter::Error>(())
//! ```
//!
//! ## Loading resources from disk
//!
//! [`SegmenterConfig`] names the dictionary and corpus files; by default they
//! are looked up under `data/`.
//!
//! ```rust,no_run
//! use thai_segmenter::{Segmenter, SegmenterConfig};
//!
//! let segmenter = Segmenter::from_config(&SegmenterConfig::default())?;
//! let sentence = segmenter.tokenize_and_postag("สวัสดีครับ");
//! println!("{}", sentence.to_json()?);
//! # Ok::<(), thai_segmenter::Error>(())
//! ```

pub mod char_categories;
pub mod config;
pub mod corpus;
pub mod custom_dictionary;
pub mod error;
pub mod resolver;
pub mod segmenter;
pub mod sentence;
pub mod tasks;
pub mod token;
pub mod tokenizer;
pub mod trie;
pub mod viterbi;

// Re-export main types for convenience
pub use char_categories::{contains_thai, get_char_category, CharCategory};
pub use config::SegmenterConfig;
pub use corpus::{
    forced_tag_key, CorpusModel, TaggedWord, FALLBACK_TAG, NON_SENTENCE_BREAK, SENTENCE_BREAK,
    SPACE_TOKEN,
};
pub use custom_dictionary::CustomDictionary;
pub use error::{Error, MissingResourcePolicy, Result};
pub use resolver::{Resolution, Resolver};
pub use segmenter::{escape_special, Segmenter};
pub use sentence::Sentence;
pub use token::{Token, TokenSpan, TokenType};
pub use tokenizer::LongestMatchTokenizer;
pub use trie::{Lookup, Trie, TrieBuilder, TrieNode};
pub use viterbi::{HiddenMarkovModel, Order, UnderflowPolicy, ViterbiDecoder, ViterbiPath};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
