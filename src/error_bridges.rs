//! Error bridge implementations for the action glue.
//!
//! This module provides `impl From<X> for ChangeglobError` conversions from
//! the binary crate's error types to the unified `ChangeglobError` type.
//!
//! These bridges live in the root crate rather than `changeglob-core` because
//! input resolution and the GitHub client are not part of core.

use changeglob_core::error::ChangeglobError;

use crate::event::EventError;
use crate::github::SourceError;
use crate::inputs::InputError;

// ============================================================================
// Bridge: InputError -> ChangeglobError
// ============================================================================

impl From<InputError> for ChangeglobError {
    fn from(err: InputError) -> Self {
        ChangeglobError::invalid_args(err.to_string())
    }
}

// ============================================================================
// Bridge: EventError -> ChangeglobError
// ============================================================================

impl From<EventError> for ChangeglobError {
    fn from(err: EventError) -> Self {
        ChangeglobError::invalid_args(err.to_string())
    }
}

// ============================================================================
// Bridge: SourceError -> ChangeglobError
// ============================================================================

impl From<SourceError> for ChangeglobError {
    fn from(err: SourceError) -> Self {
        ChangeglobError::lookup_failed(err.to_string())
    }
}
