//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Failing sources never surface here as errors from a load; the loader logs
//! them and carries on. These kinds describe why a source was skipped, and
//! the few things that do fail outright (building backends).

use derive_more::{Display, Error};
use forge_catalog::PackRef;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A source names a backend that isn't registered.
    #[display("unknown backend: {_0}")]
    UnknownBackend(#[error(not(source))] String),
    /// Browsing a source failed, after retries.
    #[display("source unavailable: {_0}")]
    SourceUnavailable(#[error(not(source))] PackRef),
    /// A configured backend couldn't be constructed.
    #[display("could not set up backend: {_0}")]
    Backend(#[error(not(source))] String),
    /// The backend type was compiled out (see the `s3` feature).
    #[display("backend type not supported by this build: {_0}")]
    UnsupportedBackend(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
