//! Domain error types.
//!
//! Two families live here: [`VotecastError`] for request-level failures that
//! reach the caller, and [`ModelError`] for per-model failures that the
//! ensemble always absorbs into a zero vote.

use chrono::NaiveDate;

/// A backtest range the backtester refuses to run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("start date {start} is after end date {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("range {start} to {end} has {found} trading dates, need at least 2")]
    TooFewDates {
        start: NaiveDate,
        end: NaiveDate,
        found: usize,
    },
}

/// Top-level error type for votecast.
#[derive(Debug, thiserror::Error)]
pub enum VotecastError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("malformed data for {symbol}: {reason}")]
    DataFormat { symbol: String, reason: String },

    #[error("series {symbol} is not strictly increasing at {date}")]
    UnorderedSeries { symbol: String, date: NaiveDate },

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VotecastError {
    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            VotecastError::Io(_) => 1,
            VotecastError::ConfigParse { .. }
            | VotecastError::ConfigMissing { .. }
            | VotecastError::ConfigInvalid { .. } => 2,
            VotecastError::NoData { .. }
            | VotecastError::DataFormat { .. }
            | VotecastError::UnorderedSeries { .. } => 3,
            VotecastError::Range(_) => 4,
        }
    }
}

impl From<&VotecastError> for std::process::ExitCode {
    fn from(err: &VotecastError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

/// Label carried by a vote when the window is shorter than a model needs.
pub const INSUFFICIENT_DATA: &str = "Insufficient Data";
/// Label for a numerical failure inside a statistical fit.
pub const MODEL_FAILED: &str = "Model Failed";

/// Longest diagnostic a failure vote carries.
pub const DIAGNOSTIC_LIMIT: usize = 50;

/// Why a single model could not produce an opinion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("need at least {required} days of data, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// Auxiliary data absent, empty, or empty after forward-fill alignment.
    #[error("{reason}")]
    NoData { label: &'static str, reason: String },

    #[error("{reason}")]
    Computation { label: &'static str, reason: String },
}

impl ModelError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ModelError::Computation {
            label: MODEL_FAILED,
            reason: reason.into(),
        }
    }

    /// Signal label for the zero vote this error collapses to.
    pub fn label(&self) -> &'static str {
        match self {
            ModelError::InsufficientHistory { .. } => INSUFFICIENT_DATA,
            ModelError::NoData { label, .. } | ModelError::Computation { label, .. } => *label,
        }
    }

    /// Diagnostic text, truncated on a character boundary.
    pub fn diagnostic(&self) -> String {
        self.to_string().chars().take(DIAGNOSTIC_LIMIT).collect()
    }
}
