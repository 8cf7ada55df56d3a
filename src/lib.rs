//! changeglob: report whether files matching a pattern changed between two commits.
//!
//! Built to run as a GitHub Actions step. The pattern compiler and path filter
//! live in `changeglob-core`; this crate adds the action glue around them.

// Core infrastructure - re-exported from changeglob-core
pub use changeglob_core::error;
pub use changeglob_core::filter;
pub use changeglob_core::output;
pub use changeglob_core::pattern;
pub use changeglob_core::{compile, filter_paths, CompiledMatcher, FilterResult, PatternMode};

// Action glue
pub mod event;
pub mod github;
pub mod inputs;
pub mod outputs;
pub mod run;

// Error bridges - converts glue errors to ChangeglobError
mod error_bridges;
