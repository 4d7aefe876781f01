//! Error handling for the mesh group model
//!
//! Errors raised while resolving face references against the pools of a
//! [`Group`](crate::Group).

use thiserror::Error;

/// Error type for group model operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A face refers to a pool entry that does not exist
    #[error("Invalid {pool} reference: index {index} (pool size {len})")]
    InvalidReference {
        pool: &'static str,
        index: usize,
        len: usize,
    },

    /// Invalid data structure
    #[error("Invalid data: {message}")]
    InvalidData {
        message: String,
    },

    /// Error with additional context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type using the group model [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an invalid data error
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Error::InvalidData {
            message: message.into(),
        }
    }

    /// Create an invalid reference error
    pub fn invalid_reference(pool: &'static str, index: usize, len: usize) -> Self {
        Error::InvalidReference { pool, index, len }
    }

    /// Check if this error (or the error it wraps) is a dangling reference
    pub fn is_invalid_reference(&self) -> bool {
        match self {
            Error::InvalidReference { .. } => true,
            Error::WithContext { source, .. } => source.is_invalid_reference(),
            Error::InvalidData { .. } => false,
        }
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
