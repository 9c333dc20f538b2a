//! Token representation for segmented Thai text.
//!
//! The tokenizer produces [`TokenSpan`]s, which only record where a token
//! ends. [`Token`] is the materialized form with its text and start offset.

use serde::{Deserialize, Serialize};

/// How the tokenizer classified a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
    /// No dictionary word starts here
    Unknown,
    /// Exactly one dictionary split fits
    Known,
    /// Several dictionary splits fit, the longest valid one was taken
    Ambiguous,
    /// A run of ASCII letters or of digits
    LatinOrDigit,
    /// A single punctuation, whitespace or symbol character
    Special,
}

impl TokenType {
    /// Convert to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Unknown => "UNKNOWN",
            TokenType::Known => "KNOWN",
            TokenType::Ambiguous => "AMBIGUOUS",
            TokenType::LatinOrDigit => "LATIN_OR_DIGIT",
            TokenType::Special => "SPECIAL",
        }
    }
}

/// End of one token inside the tokenized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    /// Byte offset one past the last character of the token
    pub end: usize,
    /// The type of this token
    pub token_type: TokenType,
}

impl TokenSpan {
    /// Create a span ending at `end`
    pub fn new(end: usize, token_type: TokenType) -> Self {
        TokenSpan { end, token_type }
    }
}

/// A single token from the tokenization process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The raw text of the token
    pub text: String,
    /// Starting byte offset in the original string
    pub start: usize,
    /// Length in bytes
    pub len: usize,
    /// The type of this token
    pub token_type: TokenType,
}

impl Token {
    /// Create a token with text and position
    pub fn with_text(text: String, start: usize, len: usize, token_type: TokenType) -> Self {
        Token {
            text,
            start,
            len,
            token_type,
        }
    }

    /// Byte offset one past the end of the token
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Check if the tokenizer found this token in the dictionary
    pub fn is_word(&self) -> bool {
        matches!(self.token_type, TokenType::Known | TokenType::Ambiguous)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Turn spans over `text` into tokens.
pub fn spans_to_tokens(text: &str, spans: &[TokenSpan]) -> Vec<Token> {
    let mut start = 0;
    spans
        .iter()
        .map(|span| {
            let token = Token::with_text(
                text[start..span.end].to_string(),
                start,
                span.end - start,
                span.token_type,
            );
            start = span.end;
            token
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_creation() {
        let token = Token::with_text("ข้าว".to_string(), 3, 12, TokenType::Known);
        assert_eq!(token.text, "ข้าว");
        assert_eq!(token.end(), 15);
        assert!(token.is_word());
        assert_eq!(token.to_string(), "ข้าว");
    }

    #[test]
    fn test_spans_to_tokens() {
        let text = "ab ก";
        let spans = [
            TokenSpan::new(2, TokenType::LatinOrDigit),
            TokenSpan::new(3, TokenType::Special),
            TokenSpan::new(6, TokenType::Unknown),
        ];
        let tokens = spans_to_tokens(text, &spans);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", " ", "ก"]);
        assert_eq!(tokens[2].start, 3);
        assert!(!tokens[2].is_word());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(TokenType::Ambiguous.as_str(), "AMBIGUOUS");
        assert_eq!(TokenType::LatinOrDigit.as_str(), "LATIN_OR_DIGIT");
    }
}
