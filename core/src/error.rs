use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T, E = TrackerError> = std::result::Result<T, E>;

/// Top-level error for every core operation.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Raw input could not be turned into a typed value
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A record for this date already exists
    #[error("An entry for {date} already exists")]
    DuplicateKey { date: NaiveDate },

    /// No record exists for this date
    #[error("No entry found for the date {date}")]
    NotFound { date: NaiveDate },

    /// SQLite failure (connectivity, constraint violation, ...)
    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    /// Malformed CSV input or output failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A CSV row that cannot become a record
    #[error("Invalid row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or unusable start-up configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Input validation failures. Each carries the name of the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid {field} '{value}'. Please enter in YYYY-MM-DD.")]
    InvalidFormat { field: String, value: String },

    #[error("Invalid {field} '{value}'. Please enter a {expected}.")]
    InvalidNumber {
        field: String,
        value: String,
        expected: &'static str,
    },

    #[error("{field} cannot be negative.")]
    Negative { field: String },

    #[error("Unknown {field} '{value}'")]
    UnknownLabel { field: String, value: String },

    #[error("Missing required column: {column}")]
    MissingColumn { column: String },
}

impl ValidationError {
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidFormat { field, .. }
            | Self::InvalidNumber { field, .. }
            | Self::Negative { field }
            | Self::UnknownLabel { field, .. } => field,
            Self::MissingColumn { column } => column,
        }
    }
}
