//! JSON report types for `--format json`.
//!
//! Every report has `status` as its first field and carries the schema
//! version. Field order and array order are deterministic.

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{ChangeglobError, OutputErrorCode};
use crate::filter::FilterResult;
use crate::pattern::PatternError;

/// Current schema version for all reports.
pub const SCHEMA_VERSION: &str = "1";

/// Successful run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResponse {
    /// Always "ok".
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// True iff any changed path matched.
    pub modified: bool,
    /// Matching paths, in diff order.
    pub modified_files: Vec<String>,
    /// Set when the changed-path lookup failed and an empty list was filtered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup_error: Option<String>,
}

impl MatchResponse {
    /// Build a report from a filter result.
    pub fn new(result: &FilterResult) -> Self {
        MatchResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            modified: result.modified,
            modified_files: result.modified_files.clone(),
            lookup_error: None,
        }
    }

    /// Record a lookup failure alongside the (empty) result.
    pub fn with_lookup_error(mut self, message: impl Into<String>) -> Self {
        self.lookup_error = Some(message.into());
        self
    }
}

/// Error details inside an [`ErrorResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code, equal to the process exit code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorInfo {
    /// Create from a ChangeglobError.
    pub fn from_error(err: &ChangeglobError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let details = match err {
            ChangeglobError::Pattern(PatternError::InvalidGlob { pattern, .. }) => {
                Some(serde_json::json!({ "pattern": pattern, "mode": "glob" }))
            }
            ChangeglobError::Pattern(PatternError::InvalidPattern { pattern, .. }) => {
                Some(serde_json::json!({ "pattern": pattern, "mode": "regex" }))
            }
            ChangeglobError::Pattern(PatternError::Translation { glob, regex, .. }) => {
                Some(serde_json::json!({ "pattern": glob, "mode": "glob", "regex": regex }))
            }
            ChangeglobError::OutputFailed { name, .. } => {
                Some(serde_json::json!({ "output": name }))
            }
            _ => None,
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

/// Failed run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always "error".
    pub status: String,
    /// Schema version.
    pub schema_version: String,
    /// What went wrong.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Build a report from an error.
    pub fn from_error(err: &ChangeglobError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

/// Emit a response as pretty-printed JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
