use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong between reading a spectrum and aggregating a batch.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(
        "histogram name '{name}' doesn't follow the naming convention \
         (expected {expected}); if you've added an extra descriptor please remove it and re-try"
    )]
    NamingConvention { name: String, expected: &'static str },

    #[error("can't parse a date from '{input}' in '{name}' (tried {tried})")]
    MetadataParse {
        name: String,
        input: String,
        tried: String,
    },

    #[error("can't estimate endpoint for '{name}': {reason}")]
    InsufficientData { name: String, reason: String },

    #[error("header field '{key}' is not present in {path:?}; available fields: {}", available.join(", "))]
    MissingField {
        key: String,
        path: PathBuf,
        available: Vec<String>,
    },

    #[error("malformed spectrum file {path:?} at line {line}: {reason}")]
    Format {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("unsupported spectrum file {0:?}")]
    UnsupportedSource(PathBuf),

    #[error("empty batch: no spectra matched the input")]
    EmptyBatch,

    #[error("bad config {path:?}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("bad input pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        AnalysisError::Format {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
