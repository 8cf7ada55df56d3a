//! Core of changeglob.
//!
//! This crate holds the parts with no I/O:
//! - Pattern compilation (glob-to-regex translation, regex compilation)
//! - Changed-path filtering
//! - Error types and exit codes
//! - JSON report types

pub mod error;
pub mod filter;
pub mod output;
pub mod pattern;

pub use filter::{filter_paths, FilterResult};
pub use pattern::{compile, glob_to_regex, CompiledMatcher, PatternError, PatternMode};
