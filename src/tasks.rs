//! Line-oriented batch tasks.
//!
//! Input is processed one line at a time so files of any size can be
//! streamed. Each processor keeps counters that can be reported when the
//! input is exhausted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::segmenter::Segmenter;

pub use crate::char_categories::contains_thai;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Whether `line` is a `<source>` document separator.
///
/// With `require_source_at_end` the line must end in `></source>`. With
/// `require_all_meta` it must also carry a date and a location or language.
pub fn is_head_line(line: &str, require_source_at_end: bool, require_all_meta: bool) -> bool {
    if require_source_at_end && !line.trim_end().ends_with("></source>") {
        return false;
    }

    if require_all_meta {
        return line.starts_with("<source><")
            && line.contains("</source>")
            && (line.contains("<date>") || line.contains("<datum>"))
            && (line.contains("<location>") || line.contains("<name_lang>"));
    }

    line.starts_with("<source><")
}

fn is_plain_head_line(line: &str) -> bool {
    is_head_line(line, false, false)
}

/// What [`LineCleaner`] does to each line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleanOptions {
    /// Pass `<source>` header lines through untouched
    pub skip_headers: bool,
    /// Drop empty lines
    pub filter_blank: bool,
    /// Drop lines without Thai characters
    pub filter_non_thai: bool,
    /// Collapse whitespace runs into one space
    pub normalize_whitespace: bool,
}

impl Default for CleanOptions {
    fn default() -> Self {
        CleanOptions {
            skip_headers: true,
            filter_blank: true,
            filter_non_thai: true,
            normalize_whitespace: true,
        }
    }
}

/// Counters of a cleaning run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanSummary {
    pub lines: usize,
    pub headers: usize,
    pub blank: usize,
    pub nonthai: usize,
    pub keep: usize,
}

/// Filters and normalizes raw text lines
#[derive(Debug, Clone, Default)]
pub struct LineCleaner {
    options: CleanOptions,
    summary: CleanSummary,
}

impl LineCleaner {
    pub fn new(options: CleanOptions) -> Self {
        LineCleaner {
            options,
            summary: CleanSummary::default(),
        }
    }

    /// Clean one line; `None` if it is dropped
    pub fn clean_line(&mut self, line: &str) -> Option<String> {
        self.summary.lines += 1;
        let line = line.trim();

        if self.options.skip_headers && is_plain_head_line(line) {
            self.summary.headers += 1;
            self.summary.keep += 1;
            return Some(line.to_string());
        }

        if line.is_empty() {
            if self.options.filter_blank {
                return None;
            }
            self.summary.blank += 1;
            self.summary.keep += 1;
            return Some(String::new());
        }

        if self.options.filter_non_thai && !contains_thai(line) {
            self.summary.nonthai += 1;
            return None;
        }

        self.summary.keep += 1;
        if self.options.normalize_whitespace {
            Some(WHITESPACE.replace_all(line, " ").into_owned())
        } else {
            Some(line.to_string())
        }
    }

    pub fn summary(&self) -> CleanSummary {
        self.summary
    }
}

/// Clean all `lines` at once
pub fn line_cleaner<I, S>(lines: I, options: CleanOptions) -> (Vec<String>, CleanSummary)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaner = LineCleaner::new(options);
    let kept = lines
        .into_iter()
        .filter_map(|line| cleaner.clean_line(line.as_ref()))
        .collect();
    (kept, cleaner.summary())
}

/// Counters of a segmenting, tokenizing or tagging run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub lines: usize,
    pub headers: usize,
    pub sentences: usize,
    /// Lines that produced more than one sentence
    pub segmented: usize,
    pub tokens: usize,
}

/// A line split around the tab column being processed
struct Columns<'l> {
    before: &'l [&'l str],
    main: &'l str,
    after: &'l [&'l str],
}

impl Columns<'_> {
    fn join(&self, main: &str) -> String {
        let mut parts: Vec<&str> = self.before.to_vec();
        parts.push(main);
        parts.extend_from_slice(self.after);
        parts.join("\t")
    }
}

/// Runs segmenter tasks over lines, optionally on one tab column
pub struct LineProcessor<'s> {
    segmenter: &'s Segmenter,
    column: Option<usize>,
    has_headers: bool,
    is_header: fn(&str) -> bool,
    summary: TaskSummary,
}

impl<'s> LineProcessor<'s> {
    pub fn new(segmenter: &'s Segmenter) -> Self {
        LineProcessor {
            segmenter,
            column: None,
            has_headers: false,
            is_header: is_plain_head_line,
            summary: TaskSummary::default(),
        }
    }

    /// Only process this 0-based tab column; the others pass through
    pub fn with_column(mut self, column: Option<usize>) -> Self {
        self.column = column;
        self
    }

    /// Pass header lines through untouched
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn with_header_detector(mut self, detector: fn(&str) -> bool) -> Self {
        self.is_header = detector;
        self
    }

    pub fn summary(&self) -> TaskSummary {
        self.summary
    }

    /// Count and trim a line. `Err` carries a line to emit as-is.
    fn prepare<'l>(&mut self, line: &'l str) -> std::result::Result<Option<&'l str>, String> {
        self.summary.lines += 1;
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if self.has_headers && (self.is_header)(line) {
            self.summary.headers += 1;
            return Err(line.to_string());
        }
        Ok(Some(line))
    }

    fn with_columns<F>(&self, line: &str, f: F) -> Result<Vec<String>>
    where
        F: FnOnce(&str) -> Vec<String>,
    {
        let Some(column) = self.column else {
            return Ok(f(line));
        };
        let parts: Vec<&str> = line.split('\t').collect();
        if column >= parts.len() {
            return Err(Error::InvalidColumn {
                column,
                fields: parts.len(),
            });
        }
        let columns = Columns {
            before: &parts[..column],
            main: parts[column],
            after: &parts[column + 1..],
        };
        Ok(f(columns.main)
            .iter()
            .map(|out| columns.join(out))
            .collect())
    }

    /// One output line per sentence
    pub fn sentence_segment_line(&mut self, line: &str) -> Result<Vec<String>> {
        let line = match self.prepare(line) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(Vec::new()),
            Err(header) => return Ok(vec![header]),
        };

        let segmenter = self.segmenter;
        let mut count = 0;
        let out = self.with_columns(line, |text| {
            let sentences = segmenter.segment_sentences(text);
            count = sentences.len();
            sentences.iter().map(|s| s.to_string()).collect()
        })?;

        if count > 1 {
            self.summary.segmented += 1;
        }
        self.summary.sentences += count;
        Ok(out)
    }

    /// Tokens joined by single spaces
    pub fn tokenize_line(&mut self, line: &str) -> Result<Vec<String>> {
        let line = match self.prepare(line) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(Vec::new()),
            Err(header) => return Ok(vec![header]),
        };

        let segmenter = self.segmenter;
        let mut count = 0;
        let out = self.with_columns(line, |text| {
            let tokens = segmenter.tokenize(text);
            count = tokens.len();
            vec![tokens.join(" ")]
        })?;

        self.summary.sentences += 1;
        self.summary.tokens += count;
        Ok(out)
    }

    /// `word|TAG` pairs joined by single spaces
    pub fn tokenize_and_tag_line(&mut self, line: &str) -> Result<Vec<String>> {
        let line = match self.prepare(line) {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(Vec::new()),
            Err(header) => return Ok(vec![header]),
        };

        let segmenter = self.segmenter;
        let mut count = 0;
        let out = self.with_columns(line, |text| {
            let sentence = segmenter.tokenize_and_postag(text);
            count = sentence.len();
            let tagged: Vec<String> = sentence
                .pairs
                .iter()
                .map(|(word, tag)| format!("{}|{}", word, tag))
                .collect();
            vec![tagged.join(" ")]
        })?;

        self.summary.sentences += 1;
        self.summary.tokens += count;
        Ok(out)
    }
}

fn run_all<I, S, F>(lines: I, mut step: F) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(&str) -> Result<Vec<String>>,
{
    let mut out = Vec::new();
    for line in lines {
        out.extend(step(line.as_ref())?);
    }
    Ok(out)
}

/// Sentence-segment every line
pub fn line_sentence_segmenter<I, S>(
    segmenter: &Segmenter,
    lines: I,
    column: Option<usize>,
    has_headers: bool,
) -> Result<(Vec<String>, TaskSummary)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut processor = LineProcessor::new(segmenter)
        .with_column(column)
        .with_headers(has_headers);
    let out = run_all(lines, |line| processor.sentence_segment_line(line))?;
    Ok((out, processor.summary()))
}

/// Tokenize every line
pub fn line_tokenizer<I, S>(
    segmenter: &Segmenter,
    lines: I,
    column: Option<usize>,
    has_headers: bool,
) -> Result<(Vec<String>, TaskSummary)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut processor = LineProcessor::new(segmenter)
        .with_column(column)
        .with_headers(has_headers);
    let out = run_all(lines, |line| processor.tokenize_line(line))?;
    Ok((out, processor.summary()))
}

/// Tokenize and POS-tag every line
pub fn line_tokenize_and_tagger<I, S>(
    segmenter: &Segmenter,
    lines: I,
    column: Option<usize>,
    has_headers: bool,
) -> Result<(Vec<String>, TaskSummary)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut processor = LineProcessor::new(segmenter)
        .with_column(column)
        .with_headers(has_headers);
    let out = run_all(lines, |line| processor.tokenize_and_tag_line(line))?;
    Ok((out, processor.summary()))
}
