//! Error types for filter compilation

use trackerdb_core::DatabaseError;

/// Why a single filter line produced no rule.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("Unsupported filter: {0}")]
    Unsupported(String),
    #[error("Skipping first-party filter: {0}")]
    FirstParty(String),
    /// Translation produced an invalid regex. This is a translator bug,
    /// not bad input, and aborts the run.
    #[error("Filter '{filter}' translated to invalid pattern '{pattern}': {source}")]
    MalformedPattern {
        filter: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl FilterError {
    /// Whether this rejection must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MalformedPattern { .. })
    }
}

/// Host classification failure for one compiled pattern.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("Cannot parse pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: Box<regex_syntax::Error>,
    },
    #[error("Sample '{sample}' for pattern '{pattern}' is not a URL: {source}")]
    Url {
        pattern: String,
        sample: String,
        #[source]
        source: trackerdb_core::url::ParseError,
    },
    #[error("Sample '{sample}' for pattern '{pattern}' has no host")]
    NoHost { pattern: String, sample: String },
}

/// Run-level failure. Any of these aborts before output is written.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    MalformedPattern(FilterError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error("Invalid self-test table: {0}")]
    SelfTestTable(#[source] serde_json::Error),
    #[error("Self-test failed for '{filter}'. Parsed: {actual}, Expected: {expected}")]
    SelfTestMismatch {
        filter: String,
        expected: String,
        actual: String,
    },
}
