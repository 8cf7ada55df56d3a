//! Webhook event payload parsing.
//!
//! Only the fields needed to pick default revisions are modelled: push
//! `before`/`after` and pull request `base.sha`/`head.sha`. Everything else in
//! the payload is ignored.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Error type for event payload loading.
#[derive(Debug, Error)]
pub enum EventError {
    /// The payload file could not be read.
    #[error("cannot read event payload {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The payload file is not valid JSON of the expected shape.
    #[error("malformed event payload {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One side of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequestBranch {
    #[serde(default)]
    pub sha: Option<String>,
}

/// The pull request part of a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub base: Option<PullRequestBranch>,
    #[serde(default)]
    pub head: Option<PullRequestBranch>,
}

/// Subset of a GitHub webhook payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventPayload {
    /// Commit before a push.
    #[serde(default)]
    pub before: Option<String>,
    /// Commit after a push.
    #[serde(default)]
    pub after: Option<String>,
    /// Present on `pull_request` and `pull_request_target` events.
    #[serde(default)]
    pub pull_request: Option<PullRequest>,
}

impl EventPayload {
    /// Load the payload at `path`, or an empty payload when no path is set.
    pub fn load(path: Option<&Path>) -> Result<Self, EventError> {
        let Some(path) = path else {
            tracing::debug!("no event payload path set, using empty payload");
            return Ok(EventPayload::default());
        };

        let contents = fs::read_to_string(path).map_err(|source| EventError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| EventError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a payload from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Default base revision: pull request base, else push `before`.
    pub fn default_base(&self) -> Option<&str> {
        match &self.pull_request {
            Some(pr) => pr.base.as_ref().and_then(|b| b.sha.as_deref()),
            None => self.before.as_deref(),
        }
    }

    /// Default head revision: pull request head, else push `after`.
    pub fn default_head(&self) -> Option<&str> {
        match &self.pull_request {
            Some(pr) => pr.head.as_ref().and_then(|h| h.sha.as_deref()),
            None => self.after.as_deref(),
        }
    }
}
