//! Error types for the pillbox_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pillbox_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A pill with the same name, dosage and unit is already in the catalog
    #[error("You already have a pill with that Name, Dosage, and Unit ({name} {dosage}{unit})")]
    DuplicatePill {
        name: String,
        dosage: f64,
        unit: String,
    },

    /// Dosage is NaN, infinite or negative
    #[error("Invalid dosage {0}: must be a finite, non-negative number")]
    InvalidDosage(f64),

    /// Index-based operation addressed a position that does not exist
    #[error("Index {index} is out of range for {collection} (length {len})")]
    IndexOutOfRange {
        collection: &'static str,
        index: usize,
        len: usize,
    },

    /// A post-condition check failed after a mutation that should have succeeded
    #[error("Integrity check failed: {0}")]
    IntegrityMismatch(String),

    /// Email selection produced no records
    #[error("No history entries selected to send")]
    NothingToSend,

    /// The email collaborator reported a failure
    #[error("Email failed: {0}")]
    EmailFailed(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    pub(crate) fn out_of_range(collection: &'static str, index: usize, len: usize) -> Self {
        Error::IndexOutOfRange {
            collection,
            index,
            len,
        }
    }
}
