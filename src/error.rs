//! Error types shared by the whole crate.

use std::path::PathBuf;

/// Result type defaulting to the crate [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while building or running a segmenter.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A dictionary, corpus or config file could not be read.
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        /// The file that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A corpus line inside a sentence block is not of the form `word/TAG`.
    #[error("malformed corpus line {line}: '{content}'")]
    MalformedCorpus {
        /// 1-based line number
        line: usize,
        /// The offending line, trimmed
        content: String,
    },

    /// Decoding was requested against a model without any tags.
    #[error("cannot decode against an empty tag set")]
    EmptyTagSet,

    /// The segmenter configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// A serialized sentence could not be parsed.
    #[error("invalid sentence JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A tab column selector pointed past the end of a line.
    #[error("column {column} out of range for line with {fields} field(s)")]
    InvalidColumn {
        /// 0-based column index
        column: usize,
        /// Number of fields on the line
        fields: usize,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// What to do when a dictionary or corpus file is missing at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingResourcePolicy {
    /// Return the I/O error to the caller
    #[default]
    Fatal,
    /// Log a warning and continue with an empty trie or model
    Warn,
}

impl MissingResourcePolicy {
    /// Apply the policy to the outcome of loading a resource.
    ///
    /// Returns `Ok(None)` when the resource is missing and the policy allows
    /// carrying on without it.
    pub(crate) fn apply<T>(self, loaded: Result<T>) -> Result<Option<T>> {
        match loaded {
            Ok(value) => Ok(Some(value)),
            Err(Error::Io { path: p, source })
                if self == MissingResourcePolicy::Warn
                    && source.kind() == std::io::ErrorKind::NotFound =>
            {
                log::warn!("resource not found, continuing without it: {}", p.display());
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
