//! The full pipeline: tokenize, tag, cut and merge.
//!
//! A [`Segmenter`] owns two tokenizers (paragraph words and corpus
//! sub-words), a shared [`CorpusModel`] and the user's custom dictionary.
//! It is immutable once built, so one instance can be shared across
//! threads.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use unicode_normalization::UnicodeNormalization;

use crate::config::SegmenterConfig;
use crate::corpus::{CorpusModel, FALLBACK_TAG, NON_SENTENCE_BREAK, SENTENCE_BREAK};
use crate::custom_dictionary::CustomDictionary;
use crate::error::Result;
use crate::resolver::{Resolution, Resolver};
use crate::sentence::{cut, merge, Sentence};
use crate::tokenizer::LongestMatchTokenizer;
use crate::trie::TrieBuilder;
use crate::viterbi::{Order, UnderflowPolicy, ViterbiDecoder};

/// Placeholders for punctuation and space tokens, matching the corpus
static SPECIAL_PLACEHOLDERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (" ", "<space>"),
        ("-", "<minus>"),
        ("_", "<underscore>"),
        ("(", "<left_parenthesis>"),
        (")", "<right_parenthesis>"),
        ("[", "<left_bracket>"),
        ("]", "<right_bracket>"),
        ("*", "<asterisk>"),
        (".", "<full_stop>"),
        ("\"", "<quotation>"),
        ("/", "<slash>"),
        (":", "<colon>"),
        ("=", "<equal>"),
        (",", "<comma>"),
        (";", "<semi_colon>"),
        ("<", "<less_than>"),
        (">", "<greater_than>"),
        ("&", "<ampersand>"),
        ("{", "<left_curly_bracket>"),
        ("|", "<pipe>"),
        ("}", "<right_curly_bracket>"),
        ("'", "<apostrophe>"),
        ("+", "<plus>"),
        ("?", "<question_mark>"),
        ("!", "<exclamation>"),
        ("$", "<dollar>"),
        ("%", "<percent>"),
    ])
});

/// Replace punctuation tokens with their corpus placeholders
pub fn escape_special<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    words
        .iter()
        .map(|word| {
            let word = word.as_ref();
            SPECIAL_PLACEHOLDERS
                .get(word)
                .map_or_else(|| word.to_string(), |p| p.to_string())
        })
        .collect()
}

/// Thai word segmenter, POS tagger and sentence splitter
#[derive(Debug, Clone)]
pub struct Segmenter {
    words: LongestMatchTokenizer,
    subwords: LongestMatchTokenizer,
    model: Arc<CorpusModel>,
    custom: CustomDictionary,
    order: Order,
    decoder: ViterbiDecoder,
}

impl Segmenter {
    /// Create a segmenter from prepared parts
    pub fn new(
        words: LongestMatchTokenizer,
        subwords: LongestMatchTokenizer,
        model: Arc<CorpusModel>,
    ) -> Self {
        Segmenter {
            words,
            subwords,
            model,
            custom: CustomDictionary::new(),
            order: Order::default(),
            decoder: ViterbiDecoder::default(),
        }
    }

    /// Load every resource named in `config`
    pub fn from_config(config: &SegmenterConfig) -> Result<Self> {
        let policy = config.missing_resources;
        let custom = config.load_custom_dictionary()?;

        let words = LongestMatchTokenizer::from_files(
            &[&config.word_dictionary],
            &config.extra_dictionaries,
            policy,
        )?;
        let subwords = LongestMatchTokenizer::from_files(
            &[&config.subword_dictionary],
            &config.extra_dictionaries,
            policy,
        )?;
        let model = policy
            .apply(CorpusModel::from_file(&config.corpus))?
            .unwrap_or_else(CorpusModel::empty);
        if model.is_empty() {
            log::warn!("no tags available, every word will be tagged {}", FALLBACK_TAG);
        }

        Ok(Segmenter::new(words, subwords, Arc::new(model))
            .with_order(config.order)
            .with_underflow_policy(config.underflow)
            .with_custom_dictionary(custom))
    }

    /// Add custom words. They become tokenizer vocabulary; tagged entries
    /// also pin their tag.
    pub fn with_custom_dictionary(mut self, custom: CustomDictionary) -> Self {
        if custom.is_empty() {
            return self;
        }
        let mut builder = TrieBuilder::from_trie(self.words.trie().clone());
        for word in custom.words() {
            builder.add(word);
        }
        self.words = LongestMatchTokenizer::new(builder.build());
        self.custom.extend(&custom);
        self
    }

    /// Decoder order used when none is given
    pub fn with_order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn with_underflow_policy(mut self, policy: UnderflowPolicy) -> Self {
        self.decoder = ViterbiDecoder::new(policy);
        self
    }

    pub fn model(&self) -> &CorpusModel {
        &self.model
    }

    /// Shared handle on the model
    pub fn model_arc(&self) -> Arc<CorpusModel> {
        Arc::clone(&self.model)
    }

    pub fn word_tokenizer(&self) -> &LongestMatchTokenizer {
        &self.words
    }

    pub fn subword_tokenizer(&self) -> &LongestMatchTokenizer {
        &self.subwords
    }

    pub fn custom_dictionary(&self) -> &CustomDictionary {
        &self.custom
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// True when there is no model to decode with
    pub fn is_degraded(&self) -> bool {
        self.model.is_empty()
    }

    fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.model, &self.subwords, &self.custom)
    }

    /// Tokens as the tagger sees them: punctuation replaced by placeholders
    /// and unknown words split into known sub-words where possible.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let escaped = escape_special(&self.words.tokenize(text));
        self.resolver().resolve(&escaped).tokens
    }

    /// One tag per token. Tokens are NFC-normalized before lookup.
    pub fn tag_sequence<S: AsRef<str>>(&self, tokens: &[S], order: Order) -> Vec<String> {
        let normalized: Vec<String> = tokens.iter().map(|t| t.as_ref().nfc().collect()).collect();
        self.tag_escaped(&escape_special(&normalized), order)
    }

    fn tag_escaped(&self, escaped: &[String], order: Order) -> Vec<String> {
        let resolution = self.resolver().resolve(escaped);
        self.decode(&resolution, order)
    }

    fn decode(&self, resolution: &Resolution, order: Order) -> Vec<String> {
        if resolution.observations.is_empty() {
            return Vec::new();
        }
        match self
            .decoder
            .decode(self.model.as_ref(), &resolution.observations, order)
        {
            Ok(path) => {
                if path.resets > 0 || path.rescales > 0 {
                    log::debug!(
                        "decoded {} observations with {} resets, {} rescales",
                        path.states.len(),
                        path.resets,
                        path.rescales
                    );
                }
                let tags: Vec<String> = path
                    .states
                    .iter()
                    .map(|&state| self.model.tags()[state].clone())
                    .collect();
                resolution.invert(&tags)
            }
            Err(e) => {
                log::debug!("{}, falling back to {}", e, FALLBACK_TAG);
                let tags = vec![FALLBACK_TAG.to_string(); resolution.observations.len()];
                resolution.invert(&tags)
            }
        }
    }

    /// Tag `text` as a single sentence with the default order.
    ///
    /// Sentence-break tags are reported as `NSBS`.
    pub fn tokenize_and_postag(&self, text: &str) -> Sentence {
        self.tokenize_and_postag_with(text, self.order)
    }

    pub fn tokenize_and_postag_with(&self, text: &str, order: Order) -> Sentence {
        let escaped = escape_special(&self.words.tokenize(text));
        let tags = self.tag_escaped(&escaped, order);
        let pairs = escaped
            .into_iter()
            .zip(tags)
            .map(|(word, tag)| {
                if tag == SENTENCE_BREAK {
                    (word, NON_SENTENCE_BREAK.to_string())
                } else {
                    (word, tag)
                }
            })
            .collect();
        Sentence::new(text, pairs)
    }

    /// Split a paragraph into sentences with the default order.
    ///
    /// Sentence content is built from the tokenized text, so it is the NFC
    /// form of `paragraph`.
    pub fn segment_sentences(&self, paragraph: &str) -> Vec<Sentence> {
        self.segment_sentences_with(paragraph, self.order)
    }

    pub fn segment_sentences_with(&self, paragraph: &str, order: Order) -> Vec<Sentence> {
        let words = self.words.tokenize(paragraph);
        let tags = self.tag_escaped(&escape_special(&words), order);
        merge(cut(&words, &tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, MissingResourcePolicy};

    const CORPUS: &str = "\
%TTitle: ตัวอย่าง
#P1
#1
ฉันกินข้าว//
ฉัน/PPRS
กิน/VACT
ข้าว/NCMN
//
#2
เขานอน//
เขา/PPRS
นอน/VACT
//
#P2
#1
แม่ กินข้าว//
แม่/NCMN
<space>/PUNC
กิน/VACT
ข้าว/NCMN
//
";

    fn segmenter() -> Segmenter {
        let mut words = TrieBuilder::new();
        words.load_lines("ฉัน\nกิน\nข้าว\nเขา\nนอน\nแม่\n");
        let mut subwords = TrieBuilder::new();
        subwords.load_lines("ฉัน\nกิน\nข้าว\nเขา\nนอน\nแม่\n");
        Segmenter::new(
            LongestMatchTokenizer::new(words.build()),
            LongestMatchTokenizer::new(subwords.build()),
            Arc::new(CorpusModel::parse(CORPUS).unwrap()),
        )
    }

    #[test]
    fn test_escape_special() {
        let escaped = escape_special(&["ไป", " ", "(", "x", "%"]);
        assert_eq!(
            escaped,
            vec!["ไป", "<space>", "<left_parenthesis>", "x", "<percent>"]
        );
    }

    #[test]
    fn test_tokenize_escapes() {
        let seg = segmenter();
        assert_eq!(seg.tokenize("ฉันกิน ข้าว"), vec!["ฉัน", "กิน", "<space>", "ข้าว"]);
        assert!(seg.tokenize("").is_empty());
    }

    #[test]
    fn test_tag_sequence_length() {
        let seg = segmenter();
        let tokens = ["ฉัน", "กิน", "ข้าว", "ไม่รู้จัก"];
        for order in [Order::Bigram, Order::Trigram] {
            let tags = seg.tag_sequence(&tokens, order);
            assert_eq!(tags.len(), tokens.len());
        }
        let tags = seg.tag_sequence(&["ฉัน", "กิน", "ข้าว"], Order::Bigram);
        assert_eq!(tags, vec!["PPRS", "VACT", "NCMN"]);
    }

    #[test]
    fn test_segment_sentences_splits_at_break() {
        let seg = segmenter();
        let sentences = seg.segment_sentences("ฉันกินข้าว เขานอน");
        let contents: Vec<&str> = sentences.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["ฉันกินข้าว", "เขานอน"]);
        assert_eq!(sentences[1].tags().collect::<Vec<_>>(), vec!["PPRS", "VACT"]);
    }

    #[test]
    fn test_tokenize_and_postag_reports_nsbs() {
        let seg = segmenter();
        let sentence = seg.tokenize_and_postag("ฉันกินข้าว เขานอน");
        assert_eq!(sentence.content, "ฉันกินข้าว เขานอน");
        assert_eq!(sentence.len(), 6);
        assert_eq!(sentence.pairs[3], ("<space>".to_string(), "NSBS".to_string()));
        assert!(sentence.tags().all(|t| t != SENTENCE_BREAK));
    }

    #[test]
    fn test_custom_dictionary() {
        let custom: CustomDictionary = [("ฉันเอง", Some("PPRS")), ("หมา", None)].into_iter().collect();
        let seg = segmenter().with_custom_dictionary(custom);
        assert_eq!(seg.word_tokenizer().words("หมากิน"), vec!["หมา", "กิน"]);
        let tags = seg.tag_sequence(&["ฉันเอง", "กิน"], Order::Bigram);
        assert_eq!(tags[0], "PPRS");
    }

    #[test]
    fn test_degraded_mode() {
        let mut words = TrieBuilder::new();
        words.load_lines("ฉัน\nกิน\n");
        let seg = Segmenter::new(
            LongestMatchTokenizer::new(words.build()),
            LongestMatchTokenizer::new(TrieBuilder::new().build()),
            Arc::new(CorpusModel::empty()),
        );
        assert!(seg.is_degraded());
        let sentences = seg.segment_sentences("ฉันกิน ฉันกิน");
        assert_eq!(sentences.len(), 1);
        assert!(sentences[0].tags().all(|t| t == FALLBACK_TAG));
        assert_eq!(sentences[0].content, "ฉันกิน ฉันกิน");
    }

    #[test]
    fn test_from_config_missing_resources() {
        let mut config = SegmenterConfig::with_data_dir("/no/such/dir");
        assert!(matches!(
            Segmenter::from_config(&config),
            Err(Error::Io { .. })
        ));

        config.missing_resources = MissingResourcePolicy::Warn;
        let seg = Segmenter::from_config(&config).unwrap();
        assert!(seg.is_degraded());
        assert!(seg.word_tokenizer().trie().is_empty());
        assert_eq!(seg.segment_sentences("กขค").len(), 1);
    }

    #[test]
    fn test_non_nfc_input_is_tagged() {
        let raw = "\u{0E01}\u{0E48}\u{0E38}\u{0E21}";
        let nfc = "\u{0E01}\u{0E38}\u{0E48}\u{0E21}";
        let corpus = format!("#P1\n#1\nx//\n{}/VACT\n//\n", raw);
        let mut words = TrieBuilder::new();
        words.add(raw);
        let words = LongestMatchTokenizer::new(words.build());
        let seg = Segmenter::new(
            words.clone(),
            words,
            Arc::new(CorpusModel::parse(&corpus).unwrap()),
        );

        let sentences = seg.segment_sentences(raw);
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].content, nfc);
        assert_eq!(sentences[0].tags().collect::<Vec<_>>(), vec!["VACT"]);
        assert_eq!(seg.tag_sequence(&[raw], Order::Bigram), vec!["VACT"]);
        assert_eq!(seg.tokenize_and_postag(raw).content, raw);

        let other = "\u{0E0A}\u{0E48}\u{0E38}\u{0E21}";
        let custom: CustomDictionary = [(other, Some("NPRP"))].into_iter().collect();
        let seg = seg.with_custom_dictionary(custom);
        assert_eq!(seg.tag_sequence(&[other], Order::Bigram), vec!["NPRP"]);
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Segmenter>();
    }
}
