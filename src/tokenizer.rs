//! The longest-match tokenizer.
//!
//! Text is scanned left to right. ASCII letters, digits and punctuation are
//! split off by character class; everything else goes through a dictionary
//! longest match that also checks whether the rest of the text can still be
//! segmented after each candidate word.

use std::path::Path;
use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;

use crate::char_categories::{
    get_char_category, is_front_dependent, is_number_part, is_rear_dependent, is_tonal,
    CharCategory,
};
use crate::error::{MissingResourcePolicy, Result};
use crate::token::{spans_to_tokens, Token, TokenSpan, TokenType};
use crate::trie::{Trie, TrieBuilder, ROOT};

/// Number of spans searched for a closing bracket or quote in line mode
const LINE_WINDOW: usize = 10;

/// Dictionary-based longest-match tokenizer
///
/// The trie is shared and immutable; all scan state is local to a call, so
/// one tokenizer can serve many threads at once.
#[derive(Debug, Clone)]
pub struct LongestMatchTokenizer {
    /// The dictionary trie (shared reference)
    trie: Arc<Trie>,
}

impl LongestMatchTokenizer {
    /// Create a new tokenizer with the given trie
    pub fn new(trie: Trie) -> Self {
        LongestMatchTokenizer {
            trie: Arc::new(trie),
        }
    }

    /// Create a new tokenizer with a shared trie reference
    pub fn with_arc(trie: Arc<Trie>) -> Self {
        LongestMatchTokenizer { trie }
    }

    /// Build a tokenizer from dictionary files.
    ///
    /// `required` files follow `policy`; `optional` files are skipped when
    /// they do not exist.
    pub fn from_files<P, Q>(
        required: &[P],
        optional: &[Q],
        policy: MissingResourcePolicy,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let mut builder = TrieBuilder::new();
        for path in required {
            policy.apply(builder.load_file(path))?;
        }
        for path in optional {
            let path = path.as_ref();
            if path.exists() {
                builder.load_file(path)?;
            } else {
                log::debug!("optional dictionary not present: {}", path.display());
            }
        }
        Ok(Self::new(builder.build()))
    }

    /// Get a reference to the trie
    pub fn trie(&self) -> &Trie {
        &self.trie
    }

    /// Get the Arc reference to the trie (for sharing)
    pub fn trie_arc(&self) -> Arc<Trie> {
        Arc::clone(&self.trie)
    }

    /// Word spans over `text`, covering it without gaps
    pub fn word_spans(&self, text: &str) -> Vec<TokenSpan> {
        let scan = Scan::run(&self.trie, text);
        scan.byte_spans()
    }

    /// Byte offsets where line units end.
    ///
    /// Line units group word spans so that brackets and quotes are not
    /// separated from their content; the last offset is always `text.len()`.
    pub fn line_breaks(&self, text: &str) -> Vec<usize> {
        let scan = Scan::run(&self.trie, text);
        scan.line_ends()
            .into_iter()
            .map(|end| scan.offsets[end])
            .collect()
    }

    /// Split `text` into words as-is
    pub fn words(&self, text: &str) -> Vec<String> {
        self.tokens(text).into_iter().map(|t| t.text).collect()
    }

    /// Tokenize a string (NFC-normalized first)
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized: String = text.nfc().collect();
        self.words(&normalized)
    }

    /// Tokens with offsets and classification
    pub fn tokens(&self, text: &str) -> Vec<Token> {
        spans_to_tokens(text, &self.word_spans(text))
    }

    /// Split `text` into line units
    pub fn lines(&self, text: &str) -> Vec<String> {
        let mut start = 0;
        self.line_breaks(text)
            .into_iter()
            .map(|end| {
                let unit = text[start..end].to_string();
                start = end;
                unit
            })
            .collect()
    }
}

/// Working state of one tokenize call. Ends are char indices.
struct Scan<'a> {
    trie: &'a Trie,
    chars: Vec<char>,
    /// Byte offset of every char, plus the text length
    offsets: Vec<usize>,
    ends: Vec<usize>,
    types: Vec<TokenType>,
}

impl<'a> Scan<'a> {
    fn run(trie: &'a Trie, text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());

        let mut scan = Scan {
            trie,
            chars,
            offsets,
            ends: Vec::new(),
            types: Vec::new(),
        };

        let len = scan.chars.len();
        let mut pos = 0;
        while pos < len {
            pos = match get_char_category(scan.chars[pos]) {
                CharCategory::Latin => {
                    let end = scan.run_end(pos, |c| c.is_ascii_alphabetic());
                    scan.push(end, TokenType::LatinOrDigit);
                    end
                }
                CharCategory::Digit => {
                    let end = scan.run_end(pos, is_number_part);
                    scan.push(end, TokenType::LatinOrDigit);
                    end
                }
                CharCategory::Special => {
                    scan.push(pos + 1, TokenType::Special);
                    pos + 1
                }
                CharCategory::Thai => scan.longest_match(pos),
            };
        }
        scan
    }

    fn run_end(&self, start: usize, part: impl Fn(char) -> bool) -> usize {
        let mut end = start + 1;
        while end < self.chars.len() && part(self.chars[end]) {
            end += 1;
        }
        end
    }

    fn push(&mut self, end: usize, token_type: TokenType) {
        self.ends.push(end);
        self.types.push(token_type);
    }

    /// Grow the previous span up to `end`; it becomes unknown.
    fn extend_last(&mut self, end: usize) {
        match (self.ends.last_mut(), self.types.last_mut()) {
            (Some(last_end), Some(last_type)) => {
                *last_end = end;
                *last_type = TokenType::Unknown;
            }
            _ => self.push(end, TokenType::Unknown),
        }
    }

    /// Whether a word can start at `begin`
    fn next_word_valid(&self, begin: usize) -> bool {
        if begin == self.chars.len() || self.chars[begin] <= '~' {
            return true;
        }
        let mut node = ROOT;
        for &ch in &self.chars[begin..] {
            match self.trie.walk(node, ch) {
                Some(next) => node = next,
                None => return false,
            }
            if self.trie.node(node).is_word() {
                return true;
            }
        }
        false
    }

    /// Match a dictionary word starting at `begin`, returning where it ends.
    fn longest_match(&mut self, begin: usize) -> usize {
        let mut longest = None;
        let mut longest_valid = None;
        let mut num_valid = 0;

        let mut node = ROOT;
        for pos in begin + 1..=self.chars.len() {
            match self.trie.walk(node, self.chars[pos - 1]) {
                Some(next) => node = next,
                None => break,
            }
            if !self.trie.node(node).is_word() {
                continue;
            }
            longest = Some(pos);
            if self.next_word_valid(pos) {
                longest_valid = Some(pos);
                num_valid += 1;
            }
        }

        let prev = if begin >= 1 {
            self.chars[begin - 1]
        } else {
            '\0'
        };
        let glue_to_prev = is_rear_dependent(prev);

        let Some(longest) = longest else {
            let end = begin + 1;
            let current = self.chars[begin];
            let merge = !self.ends.is_empty()
                && (is_front_dependent(current)
                    || is_tonal(current)
                    || glue_to_prev
                    || self.types.last() == Some(&TokenType::Unknown));
            if merge {
                self.extend_last(end);
            } else {
                self.push(end, TokenType::Unknown);
            }
            return end;
        };

        // known word followed by something unsegmentable
        let Some(longest_valid) = longest_valid else {
            if glue_to_prev {
                self.extend_last(longest);
            } else {
                self.push(longest, TokenType::Known);
            }
            return longest;
        };

        if glue_to_prev {
            self.extend_last(longest_valid);
        } else if num_valid == 1 {
            self.push(longest_valid, TokenType::Known);
        } else {
            self.push(longest_valid, TokenType::Ambiguous);
        }
        longest_valid
    }

    fn byte_spans(&self) -> Vec<TokenSpan> {
        self.ends
            .iter()
            .zip(&self.types)
            .map(|(&end, &token_type)| TokenSpan::new(self.offsets[end], token_type))
            .collect()
    }

    fn last_char(&self, end: usize) -> char {
        self.chars[end - 1]
    }

    /// Char indices where line units end
    fn line_ends(&self) -> Vec<usize> {
        let count = self.ends.len();
        let mut units = Vec::new();

        let mut i = 0;
        while i < count {
            let cur_end = self.ends[i];
            let cur_type = self.types[i];

            match cur_type {
                TokenType::LatinOrDigit | TokenType::Special => {
                    let closer = match (cur_type, self.last_char(cur_end)) {
                        (TokenType::Special, '(') => Some(')'),
                        (TokenType::Special, '\'') => Some('\''),
                        (TokenType::Special, '"') => Some('"'),
                        _ => None,
                    };
                    match closer {
                        Some(closer) => {
                            let mut pos = i + 1;
                            while pos < count && pos < i + LINE_WINDOW {
                                let end = self.ends[pos];
                                let token_type = self.types[pos];
                                pos += 1;
                                if token_type == TokenType::Special && self.last_char(end) == closer
                                {
                                    units.push(end);
                                    i = pos - 1;
                                    break;
                                }
                            }
                        }
                        None => units.push(cur_end),
                    }
                }
                _ if i + 1 < count => {
                    let next_end = self.ends[i + 1];
                    let next_type = self.types[i + 1];
                    let opens_next = next_type == TokenType::Special
                        && matches!(self.last_char(next_end), ' ' | '"' | '(' | '\'');
                    if next_type == TokenType::LatinOrDigit || opens_next {
                        units.push(cur_end);
                    } else if cur_type == TokenType::Known
                        && !matches!(next_type, TokenType::Unknown | TokenType::Special)
                    {
                        units.push(cur_end);
                    }
                }
                _ => {}
            }
            i += 1;
        }

        let len = self.chars.len();
        if len > 0 && units.last() != Some(&len) {
            units.push(len);
        }
        units
    }
}
