use std::time::Duration;

use thiserror::Error;

/// Application-wide error types for jobscout.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// Query or filter parameters were rejected before any I/O.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A fetch exceeded its time budget.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// HTTP request failed (bad status, unreadable body, transport error).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The headless browser could not be launched or driven.
    #[error("Browser error: {0}")]
    BrowserError(String),

    /// Markup could not be queried (e.g. an unparsable selector).
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// The cache store could not be read or written.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Missing or malformed runtime configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if the error came from a fetch running out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AppError::Timeout(_))
    }

    /// Returns true if the error came from the fetch transport
    /// (HTTP, network, or browser driver) rather than from our own logic.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AppError::HttpError(_) | AppError::NetworkError(_) | AppError::BrowserError(_)
        )
    }
}

/// Reasons a search request is rejected as a bad request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameters: keyword and location")]
    MissingParameters,

    #[error("Parameter '{field}' is too long (maximum 100 characters)")]
    TooLong { field: &'static str },

    #[error("Parameter '{field}' contains no valid characters")]
    InvalidCharacters { field: &'static str },

    #[error("Unknown parameter '{name}'")]
    UnknownFilter { name: String },

    #[error("Filter '{name}' is not supported on this endpoint")]
    FilterNotSupported { name: String },

    #[error("Parameter '{name}' was given more than once")]
    DuplicateParameter { name: String },

    #[error("Invalid {name}. Allowed values: {allowed}")]
    InvalidFilterValue { name: &'static str, allowed: String },

    #[error("Invalid company. Provide at least one company name")]
    NoValidCompanies,

    #[error("Too many companies ({count}). Maximum is 10")]
    TooManyCompanies { count: usize },
}
