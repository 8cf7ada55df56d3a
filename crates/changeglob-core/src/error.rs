//! Error types and exit codes for changeglob.
//!
//! `ChangeglobError` is the single error type the CLI reports. Domain errors
//! (pattern compilation here, input resolution and changed-path lookup in the
//! binary crate) are bridged into it with `From` impls.
//!
//! ## Exit Codes
//!
//! - `2`: Invalid arguments (bad input, invalid glob, invalid regex)
//! - `3`: Changed-path lookup failed
//! - `4`: Writing outputs failed
//! - `10`: Internal errors (bugs, unexpected state)

use std::fmt;

use thiserror::Error;

use crate::pattern::PatternError;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Stable error codes, used as process exit codes and in JSON error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, invalid pattern).
    InvalidArguments = 2,
    /// The changed-path source failed.
    LookupFailed = 3,
    /// Outputs could not be written.
    OutputFailed = 4,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
#[derive(Debug, Error)]
pub enum ChangeglobError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments { message: String },

    /// The pattern input could not be compiled.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Listing changed paths failed.
    #[error("failed to compare commits: {message}")]
    LookupFailed { message: String },

    /// Writing outputs failed.
    #[error("failed to write output '{name}': {message}")]
    OutputFailed { name: String, message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl ChangeglobError {
    /// Create an invalid arguments error.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        ChangeglobError::InvalidArguments {
            message: message.into(),
        }
    }

    /// Create a lookup error.
    pub fn lookup_failed(message: impl Into<String>) -> Self {
        ChangeglobError::LookupFailed {
            message: message.into(),
        }
    }

    /// Create an output error.
    pub fn output_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        ChangeglobError::OutputFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ChangeglobError::InternalError {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&ChangeglobError> for OutputErrorCode {
    fn from(err: &ChangeglobError) -> Self {
        match err {
            ChangeglobError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            ChangeglobError::Pattern(PatternError::InvalidGlob { .. }) => {
                OutputErrorCode::InvalidArguments
            }
            ChangeglobError::Pattern(PatternError::InvalidPattern { .. }) => {
                OutputErrorCode::InvalidArguments
            }
            ChangeglobError::Pattern(PatternError::Translation { .. }) => {
                OutputErrorCode::InternalError
            }
            ChangeglobError::LookupFailed { .. } => OutputErrorCode::LookupFailed,
            ChangeglobError::OutputFailed { .. } => OutputErrorCode::OutputFailed,
            ChangeglobError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<ChangeglobError> for OutputErrorCode {
    fn from(err: ChangeglobError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Tests
// ============================================================================
