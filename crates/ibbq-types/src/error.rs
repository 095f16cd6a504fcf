//! Error types for data parsing in ibbq-types.

use thiserror::Error;

/// Errors that can occur when parsing iBBQ notification payloads.
///
/// This error type is transport-agnostic and does not include BLE-specific
/// errors (those belong in ibbq-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// Payload shorter than the frame it claims to be.
    #[error("payload too short: expected at least {expected} bytes, got {actual}")]
    Truncated {
        /// Minimum number of bytes the frame requires.
        expected: usize,
        /// Number of bytes actually received.
        actual: usize,
    },

    /// Temperature payload whose length is not a whole number of probes.
    #[error("temperature payload of {0} bytes is not a whole number of probe values")]
    OddLength(usize),
}

/// Result type alias using ibbq-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
