//! Error types for sfo-records
//!
//! Two families are kept apart: [`UsageError`] covers caller and
//! configuration mistakes and is always raised synchronously, while
//! [`ResultError`] covers response and record data problems. Both are
//! wrapped by the crate-level [`Error`].

use crate::sobject::SObject;
use crate::types::JsonObject;
use std::fmt;
use thiserror::Error;

/// Boxed underlying cause carried by some result errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ============================================================================
// Error Codes
// ============================================================================

/// Named failure code shared by both error families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Resolved class is not a registered SObject class
    BadSfoClassname,
    /// Response status is neither a success nor an empty success
    UnexpectedStatusCode,
    /// Response body could not be decoded into an envelope
    UnparsableResponse,
    /// A record failed to materialize during iteration
    UnparsableRecord,
}

impl ErrorCode {
    /// Stable upper-case identifier of the code
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadSfoClassname => "BAD_SFO_CLASSNAME",
            Self::UnexpectedStatusCode => "UNEXPECTED_STATUS_CODE",
            Self::UnparsableResponse => "UNPARSABLE_RESPONSE",
            Self::UnparsableRecord => "UNPARSABLE_RECORD",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Usage Errors
// ============================================================================

/// Caller or configuration misuse, detected eagerly
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("'{class_name}' is not a registered SObject class")]
    BadSfoClassname { class_name: String },
}

impl UsageError {
    /// Create a bad class name error
    pub fn bad_class_name(class_name: impl Into<String>) -> Self {
        Self::BadSfoClassname {
            class_name: class_name.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BadSfoClassname { .. } => ErrorCode::BadSfoClassname,
        }
    }
}

// ============================================================================
// Result Errors
// ============================================================================

/// Response or record data problems
#[derive(Error, Debug)]
pub enum ResultError {
    #[error("Unexpected HTTP status code {status}")]
    UnexpectedStatusCode { status: u16 },

    #[error("Unparsable response: {message}")]
    UnparsableResponse {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Carries the raw record, the class it was parsed as and the object
    /// built so far, if construction got that far.
    #[error("Unparsable record for class '{class_name}': {source}")]
    UnparsableRecord {
        record: JsonObject,
        class_name: String,
        object: Option<Box<dyn SObject>>,
        #[source]
        source: Box<Error>,
    },
}

impl ResultError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnexpectedStatusCode { .. } => ErrorCode::UnexpectedStatusCode,
            Self::UnparsableResponse { .. } => ErrorCode::UnparsableResponse,
            Self::UnparsableRecord { .. } => ErrorCode::UnparsableRecord,
        }
    }
}

// ============================================================================
// Crate Error
// ============================================================================

/// The main error type for sfo-records
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Result(#[from] ResultError),

    #[error("Missing record field: {field}")]
    MissingField { field: String },

    #[error("Invalid record field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an unexpected status result error
    pub fn unexpected_status(status: u16) -> Self {
        Self::Result(ResultError::UnexpectedStatusCode { status })
    }

    /// Create an unparsable response error wrapping its cause
    pub fn unparsable_response(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Result(ResultError::UnparsableResponse {
            message: message.into(),
            source: Some(source.into()),
        })
    }

    /// Create a missing record field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create an invalid record field error
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing config field error
    pub fn missing_config_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Named code, for usage and result errors only
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Error::Usage(e) => Some(e.code()),
            Error::Result(e) => Some(e.code()),
            _ => None,
        }
    }

    /// Check if this is a caller/configuration mistake
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }

    /// Check if this is a response or record data problem
    pub fn is_result(&self) -> bool {
        matches!(self, Error::Result(_))
    }
}

/// Result type alias for sfo-records
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
