use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// The Error type for analysis operations.
///
/// Load- and schema-level failures are fatal to a session; criteria and
/// column-availability failures are recoverable and callers are expected to
/// re-prompt or render a "not available" state. Filtering down to zero rows
/// is NOT an error anywhere in this crate.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to read input table: {source}")]
    Load {
        #[from]
        source: csv::Error,
    },

    #[error("Required columns missing from input table: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid filter criteria: {0}")]
    InvalidCriteria(String),

    #[error("Column '{column}' is not available in this dataset")]
    ColumnUnavailable { column: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}
