//! Changed-path filtering.
//!
//! Applies a [`CompiledMatcher`] to the ordered list of changed paths. The
//! result keeps the input order and any duplicates; nothing is sorted.

use serde::{Deserialize, Serialize};

use crate::pattern::CompiledMatcher;

/// Return the paths accepted by `matcher`, in input order.
pub fn filter_paths<S: AsRef<str>>(matcher: &CompiledMatcher, paths: &[S]) -> Vec<String> {
    paths
        .iter()
        .map(AsRef::as_ref)
        .filter(|path| matcher.is_match(path))
        .map(str::to_string)
        .collect()
}

/// Matching paths plus the derived `modified` flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    /// True iff at least one changed path matched.
    pub modified: bool,
    /// Matching paths, in the order the diff source returned them.
    pub modified_files: Vec<String>,
}

impl FilterResult {
    /// Filter `paths` with `matcher`.
    pub fn from_paths<S: AsRef<str>>(matcher: &CompiledMatcher, paths: &[S]) -> Self {
        let modified_files = filter_paths(matcher, paths);
        tracing::debug!(
            candidates = paths.len(),
            matched = modified_files.len(),
            "filtered changed paths"
        );
        FilterResult::from_matches(modified_files)
    }

    /// Wrap an already-filtered list.
    pub fn from_matches(modified_files: Vec<String>) -> Self {
        FilterResult {
            modified: !modified_files.is_empty(),
            modified_files,
        }
    }

    /// The result reported when no pattern could be compiled.
    pub fn empty() -> Self {
        FilterResult::default()
    }

    /// `modified` as the JSON text written to the output channel.
    pub fn modified_json(&self) -> String {
        serde_json::Value::Bool(self.modified).to_string()
    }

    /// `modified_files` as compact JSON text.
    pub fn modified_files_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.modified_files)
    }
}
