//! Character classification for the longest-match tokenizer.
//!
//! Thai script has combining vowels and tone marks that can never start or
//! end a word on their own. The tokenizer uses the classes below to decide
//! where a scan position starts a new span and when an unknown character has
//! to be glued onto the span before it.

/// Broad class of a character, checked before any dictionary lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharCategory {
    /// ASCII letter, start of a Latin run
    Latin,
    /// ASCII or Thai digit, start of a number run
    Digit,
    /// ASCII punctuation, whitespace, control characters and a few extra
    /// quote/symbol code points; always a span of its own
    Special,
    /// Everything else: Thai script and any other non-ASCII character
    Thai,
}

/// Vowels and marks that attach to the consonant before them
const FRONT_DEPENDENT: &[char] = &[
    '\u{0E30}', // SARA A
    '\u{0E31}', // MAI HAN-AKAT
    '\u{0E32}', // SARA AA
    '\u{0E33}', // SARA AM
    '\u{0E34}', // SARA I
    '\u{0E35}', // SARA II
    '\u{0E36}', // SARA UE
    '\u{0E37}', // SARA UEE
    '\u{0E38}', // SARA U
    '\u{0E39}', // SARA UU
    '\u{0E45}', // LAKKHANGYAO
    '\u{0E47}', // MAITAIKHU
    '\u{0E4C}', // THANTHAKHAT
    '\u{0E4D}', // NIKHAHIT
];

/// Characters that need a following consonant
const REAR_DEPENDENT: &[char] = &[
    '\u{0E31}', // MAI HAN-AKAT
    '\u{0E37}', // SARA UEE
    '\u{0E40}', // SARA E
    '\u{0E41}', // SARA AE
    '\u{0E42}', // SARA O
    '\u{0E43}', // SARA AI MAIMUAN
    '\u{0E44}', // SARA AI MAIMALAI
    '\u{0E4D}', // NIKHAHIT
];

/// Tone marks
const TONAL: &[char] = &['\u{0E48}', '\u{0E49}', '\u{0E4A}', '\u{0E4B}'];

/// Non-ASCII code points that are still single-character special spans
const EXTRA_SPECIAL: &[char] = &[
    '\u{00E6}', // LATIN SMALL LETTER AE
    '\u{00CF}', // LATIN CAPITAL LETTER I WITH DIAERESIS
    '\u{201C}', // LEFT DOUBLE QUOTATION MARK
    '\u{201D}', // RIGHT DOUBLE QUOTATION MARK
];

/// Get the category of a character
pub fn get_char_category(c: char) -> CharCategory {
    if c.is_ascii_alphabetic() {
        return CharCategory::Latin;
    }
    if is_digit(c) {
        return CharCategory::Digit;
    }
    if c <= '~' || EXTRA_SPECIAL.contains(&c) {
        return CharCategory::Special;
    }
    CharCategory::Thai
}

/// ASCII digits and Thai digits (U+0E50..U+0E59)
pub fn is_digit(c: char) -> bool {
    c.is_ascii_digit() || ('\u{0E50}'..='\u{0E59}').contains(&c)
}

/// Whether `c` may continue a number run (digits plus group separators)
pub fn is_number_part(c: char) -> bool {
    is_digit(c) || c == ',' || c == '.'
}

/// Vowel or mark that cannot begin a word
pub fn is_front_dependent(c: char) -> bool {
    FRONT_DEPENDENT.contains(&c)
}

/// Character that cannot end a word
pub fn is_rear_dependent(c: char) -> bool {
    REAR_DEPENDENT.contains(&c)
}

/// Thai tone mark
pub fn is_tonal(c: char) -> bool {
    TONAL.contains(&c)
}

/// Whether `c` belongs to the Thai Unicode block proper.
///
/// Covers U+0E01..U+0E3A and U+0E40..U+0E5B; the currency sign and the
/// unassigned gap in between are excluded.
pub fn is_thai(c: char) -> bool {
    ('\u{0E01}'..='\u{0E3A}').contains(&c) || ('\u{0E40}'..='\u{0E5B}').contains(&c)
}

/// Whether the line contains at least one Thai character
pub fn contains_thai(line: &str) -> bool {
    line.chars().any(is_thai)
}
