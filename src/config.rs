//! Segmenter configuration.
//!
//! All fields have defaults, so `{}` is a valid configuration file. Paths
//! are used as given; [`SegmenterConfig::with_data_dir`] resolves the
//! default file names against a directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::custom_dictionary::CustomDictionary;
use crate::error::{Error, MissingResourcePolicy, Result};
use crate::viterbi::{Order, UnderflowPolicy};

const WORD_DICTIONARY: &str = "lexitron.txt";
const UNKNOWN_DICTIONARY: &str = "unknown.txt";
const SUBWORD_DICTIONARY: &str = "orchid_words.txt";
const CORPUS: &str = "orchid97.txt";

/// Where the segmenter's resources live and how it decodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmenterConfig {
    /// Dictionary for paragraph-level tokenization
    pub word_dictionary: PathBuf,
    /// Extra word lists loaded into both tokenizers when present
    pub extra_dictionaries: Vec<PathBuf>,
    /// Corpus word list used to split unknown words
    pub subword_dictionary: PathBuf,
    /// Tagged corpus in ORCHID format
    pub corpus: PathBuf,
    pub order: Order,
    pub missing_resources: MissingResourcePolicy,
    pub underflow: UnderflowPolicy,
    /// Inline custom words; these win over `custom_dictionary_file`
    pub custom_dictionary: CustomDictionary,
    /// TSV file of custom words
    pub custom_dictionary_file: Option<PathBuf>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}

impl SegmenterConfig {
    /// Default file names inside `dir`
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        SegmenterConfig {
            word_dictionary: dir.join(WORD_DICTIONARY),
            extra_dictionaries: vec![dir.join(UNKNOWN_DICTIONARY)],
            subword_dictionary: dir.join(SUBWORD_DICTIONARY),
            corpus: dir.join(CORPUS),
            order: Order::default(),
            missing_resources: MissingResourcePolicy::default(),
            underflow: UnderflowPolicy::default(),
            custom_dictionary: CustomDictionary::default(),
            custom_dictionary_file: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&content)
    }

    /// Inline entries merged over the entries of `custom_dictionary_file`
    pub fn load_custom_dictionary(&self) -> Result<CustomDictionary> {
        let mut dict = CustomDictionary::new();
        if let Some(path) = &self.custom_dictionary_file {
            self.missing_resources.apply(dict.load_file(path))?;
        }
        dict.extend(&self.custom_dictionary);
        Ok(dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SegmenterConfig::default();
        assert_eq!(config.word_dictionary, Path::new("data/lexitron.txt"));
        assert_eq!(config.corpus, Path::new("data/orchid97.txt"));
        assert_eq!(config.order, Order::Bigram);
        assert_eq!(config.missing_resources, MissingResourcePolicy::Fatal);
        assert_eq!(config.underflow.reset_below, 1e-40);
    }

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(SegmenterConfig::from_json("{}").unwrap(), SegmenterConfig::default());
    }

    #[test]
    fn test_json_fields() {
        let config = SegmenterConfig::from_json(
            r#"{
                "corpus": "/srv/orchid.txt",
                "order": "trigram",
                "missing_resources": "warn",
                "underflow": {"rescale_below": 1e-20},
                "custom_dictionary": {"กรุงเทพ": "NPRP"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.corpus, Path::new("/srv/orchid.txt"));
        assert_eq!(config.order, Order::Trigram);
        assert_eq!(config.missing_resources, MissingResourcePolicy::Warn);
        assert_eq!(config.underflow.rescale_below, 1e-20);
        assert_eq!(config.underflow.reset_below, 1e-40);
        assert_eq!(config.custom_dictionary.forced_tag("กรุงเทพ"), Some("NPRP"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = SegmenterConfig::from_json(r#"{"corpsu": "x"}"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_custom_file_under_warn() {
        let mut config = SegmenterConfig::default();
        config.custom_dictionary_file = Some(PathBuf::from("/no/such/custom.tsv"));
        config.custom_dictionary.insert("ไลน์", None);
        assert!(config.load_custom_dictionary().is_err());

        config.missing_resources = MissingResourcePolicy::Warn;
        let dict = config.load_custom_dictionary().unwrap();
        assert!(dict.contains("ไลน์"));
    }
}
