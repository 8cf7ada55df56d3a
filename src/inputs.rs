//! Action input resolution.
//!
//! Raw values come from command-line flags or the `INPUT_*` environment
//! variables the Actions runner sets (clap reads both). [`ActionInputs::resolve`]
//! fills the gaps from the event payload and `GITHUB_REPOSITORY` and produces
//! one explicit record that the rest of the run borrows.
//!
//! An empty string counts as "not provided" everywhere, matching how the
//! runner passes inputs that were declared but not set.

use std::fmt;

use changeglob_core::PatternMode;
use thiserror::Error;

use crate::event::EventPayload;

/// Default REST endpoint when `GITHUB_API_URL` is unset.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Error type for input resolution.
#[derive(Debug, Error)]
pub enum InputError {
    /// A required input has no value and no default.
    #[error("\"{name}\" input is required{hint}")]
    Missing { name: &'static str, hint: &'static str },

    /// A boolean input has an unrecognised value.
    #[error("input '{name}' must be one of true, True, TRUE, false, False, FALSE (got '{value}')")]
    InvalidBool { name: &'static str, value: String },
}

/// Inputs as collected, before defaults are applied.
#[derive(Clone, Default)]
pub struct RawInputs {
    pub pattern: Option<String>,
    pub use_glob: Option<String>,
    pub base: Option<String>,
    pub head: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    /// Token candidates in priority order.
    pub tokens: Vec<Option<String>>,
    /// `owner/repo`, normally from `GITHUB_REPOSITORY`.
    pub repository: Option<String>,
    pub api_url: Option<String>,
}

/// Fully resolved inputs for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ActionInputs {
    pub pattern: String,
    pub mode: PatternMode,
    pub base: String,
    pub head: String,
    pub owner: String,
    pub repo: String,
    pub token: Option<String>,
    pub api_url: String,
}

impl ActionInputs {
    /// Apply defaults to `raw` and check that nothing required is missing.
    pub fn resolve(raw: &RawInputs, payload: &EventPayload) -> Result<Self, InputError> {
        let pattern = non_empty(raw.pattern.as_deref()).unwrap_or_default();
        let use_glob = parse_bool_input("use-glob", raw.use_glob.as_deref())?;

        let base = first(&[non_empty(raw.base.as_deref()), non_empty(payload.default_base())])
            .ok_or(InputError::Missing {
                name: "base",
                hint: " when triggering on events different from pushes",
            })?;
        let head = first(&[non_empty(raw.head.as_deref()), non_empty(payload.default_head())])
            .ok_or(InputError::Missing {
                name: "head",
                hint: " when triggering on events different from pushes",
            })?;

        let (default_owner, default_repo) = split_repository(raw.repository.as_deref());
        let owner = first(&[non_empty(raw.owner.as_deref()), default_owner]).ok_or(
            InputError::Missing {
                name: "owner",
                hint: " when GITHUB_REPOSITORY is not set",
            },
        )?;
        let repo = first(&[non_empty(raw.repo.as_deref()), default_repo]).ok_or(
            InputError::Missing {
                name: "repo",
                hint: " when GITHUB_REPOSITORY is not set",
            },
        )?;

        let token = raw
            .tokens
            .iter()
            .find_map(|candidate| non_empty(candidate.as_deref()));

        let api_url = non_empty(raw.api_url.as_deref())
            .unwrap_or(DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();

        let inputs = ActionInputs {
            pattern: pattern.to_string(),
            mode: PatternMode::from_use_glob(use_glob),
            base: base.to_string(),
            head: head.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            token: token.map(str::to_string),
            api_url,
        };
        tracing::info!(?inputs, "resolved inputs");
        Ok(inputs)
    }
}

impl fmt::Debug for ActionInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionInputs")
            .field("pattern", &self.pattern)
            .field("mode", &self.mode)
            .field("base", &self.base)
            .field("head", &self.head)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl fmt::Debug for RawInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawInputs")
            .field("pattern", &self.pattern)
            .field("use_glob", &self.use_glob)
            .field("base", &self.base)
            .field("head", &self.head)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("tokens", &self.tokens.iter().flatten().count())
            .field("repository", &self.repository)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Parse a boolean input the way the Actions toolkit does.
///
/// Unset and empty inputs are `false`.
pub fn parse_bool_input(name: &'static str, value: Option<&str>) -> Result<bool, InputError> {
    match value.map(str::trim) {
        None | Some("") => Ok(false),
        Some("true" | "True" | "TRUE") => Ok(true),
        Some("false" | "False" | "FALSE") => Ok(false),
        Some(other) => Err(InputError::InvalidBool {
            name,
            value: other.to_string(),
        }),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn first<'a>(candidates: &[Option<&'a str>]) -> Option<&'a str> {
    candidates.iter().flatten().next().copied()
}

/// Split `owner/repo` into its halves.
fn split_repository(repository: Option<&str>) -> (Option<&str>, Option<&str>) {
    match non_empty(repository).map(|r| r.split_once('/')) {
        Some(Some((owner, repo))) => (non_empty(Some(owner)), non_empty(Some(repo))),
        Some(None) => {
            tracing::warn!(repository, "GITHUB_REPOSITORY is not of the form owner/repo");
            (None, None)
        }
        None => (None, None),
    }
}
