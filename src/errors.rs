/*!
 * Error types for the srtreflow application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

// Allow dead code - error types are for library consumers
#![allow(dead_code)]

use thiserror::Error;

/// Errors that can occur when talking to the reformatting oracle
#[derive(Error, Debug)]
pub enum OracleError {
    /// The oracle could not be reached (network, DNS, timeout)
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),

    /// The oracle rejected the request due to rate or usage limits
    #[error("Oracle quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The oracle rejected the supplied credentials
    #[error("Invalid oracle credential: {0}")]
    InvalidCredential(String),

    /// The oracle answered but the payload could not be decoded
    #[error("Malformed oracle response: {0}")]
    MalformedResponse(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },
}

/// Errors that can occur while parsing or serializing caption files
#[derive(Error, Debug)]
pub enum CaptionError {
    /// A timestamp string does not match the HH:MM:SS,mmm pattern
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    /// Non-empty input yielded no valid caption blocks
    #[error("No caption entries could be parsed from non-empty input")]
    NoEntriesParsed,
}

/// Errors that can occur during a reflow run
#[derive(Error, Debug)]
pub enum ReflowError {
    /// The outbound oracle request could not be encoded
    #[error("Request encoding error: {0}")]
    Request(String),

    /// Error from the oracle
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Error from caption processing
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the oracle
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Error from caption processing
    #[error("Caption error: {0}")]
    Caption(#[from] CaptionError),

    /// Error from a reflow run
    #[error("Reflow error: {0}")]
    Reflow(#[from] ReflowError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
