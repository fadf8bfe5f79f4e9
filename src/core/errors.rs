//! Error types for the refrain library.
//!
//! One structured error enum covers every stage of the pipeline; variants
//! carry enough context that the CLI can surface a single useful line and
//! map the kind to an exit code.

use std::io;

use thiserror::Error;

/// Main result type for refrain operations.
pub type Result<T> = std::result::Result<T, RefrainError>;

/// Comprehensive error type for all refrain operations.
#[derive(Error, Debug)]
pub enum RefrainError {
    /// I/O related errors (missing path, unreadable file, append failure)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Store append or log maintenance failures
    #[error("Storage error in dataset '{dataset}': {message}")]
    Storage {
        /// Error description
        message: String,
        /// Dataset the operation targeted
        dataset: String,
        /// Underlying I/O error, when one exists
        #[source]
        source: Option<io::Error>,
    },

    /// Malformed stored record encountered outside a tolerant scan
    #[error("Decode error in dataset '{dataset}': {message}")]
    Decode {
        /// Error description
        message: String,
        /// Dataset the record came from
        dataset: String,
        /// Line number within the log, if known
        line: Option<usize>,
    },

    /// A stage prerequisite dataset is absent or empty
    #[error("Dataset '{dataset}' is empty; run the previous stage first")]
    EmptyDataset {
        /// The missing dataset
        dataset: String,
    },

    /// Analysis pipeline errors
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unsupported operation or feature
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error description
        message: String,
    },
}

impl RefrainError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new storage error without an I/O source
    pub fn storage(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            dataset: dataset.into(),
            source: None,
        }
    }

    /// Create a new storage error wrapping an I/O failure
    pub fn storage_io(
        dataset: impl Into<String>,
        message: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            dataset: dataset.into(),
            source: Some(source),
        }
    }

    /// Create a new decode error
    pub fn decode(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            dataset: dataset.into(),
            line: None,
        }
    }

    /// Create a new empty-dataset error
    pub fn empty_dataset(dataset: impl Into<String>) -> Self {
        Self::EmptyDataset {
            dataset: dataset.into(),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new validation error with field context
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new unsupported error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Process exit code for this error kind.
    ///
    /// Missing prerequisites exit 1; everything else that reaches the CLI
    /// edge exits 2.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EmptyDataset { .. } => 1,
            _ => 2,
        }
    }
}

// Implement From traits for common error types
impl From<io::Error> for RefrainError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for RefrainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for RefrainError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}
