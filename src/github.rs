//! Changed-path lookup through the GitHub REST API.
//!
//! [`ChangedPathsSource`] is the seam between the run and the network;
//! [`GitHubCompare`] implements it with the "compare two commits" endpoint.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::inputs::ActionInputs;

/// Global timeout for one compare request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST API version sent with every request.
pub const API_VERSION: &str = "2022-11-28";

/// Error type for changed-path lookup.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The API answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The request never got an answer.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The response body was not a comparison.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// What to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRequest {
    pub owner: String,
    pub repo: String,
    pub base: String,
    pub head: String,
}

impl CompareRequest {
    /// Take the coordinates from resolved inputs.
    pub fn from_inputs(inputs: &ActionInputs) -> Self {
        CompareRequest {
            owner: inputs.owner.clone(),
            repo: inputs.repo.clone(),
            base: inputs.base.clone(),
            head: inputs.head.clone(),
        }
    }
}

/// Lists the paths that differ between two revisions.
pub trait ChangedPathsSource {
    /// Changed paths in the order the source reports them.
    fn changed_paths(&self, request: &CompareRequest) -> Result<Vec<String>, SourceError>;
}

/// A file entry in a comparison response.
#[derive(Debug, Deserialize)]
struct ComparisonFile {
    filename: String,
}

/// The part of a comparison response we read.
#[derive(Debug, Deserialize)]
struct Comparison {
    #[serde(default)]
    files: Vec<ComparisonFile>,
}

impl Comparison {
    fn into_paths(self) -> Vec<String> {
        self.files.into_iter().map(|f| f.filename).collect()
    }
}

/// [`ChangedPathsSource`] backed by `GET /repos/{owner}/{repo}/compare/{base}...{head}`.
pub struct GitHubCompare {
    agent: ureq::Agent,
    api_url: String,
    token: Option<String>,
}

impl GitHubCompare {
    /// Create a client for `api_url`, authenticating with `token` when given.
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build();
        GitHubCompare {
            agent: config.into(),
            api_url: api_url.into(),
            token,
        }
    }

    /// Create a client from resolved inputs.
    pub fn from_inputs(inputs: &ActionInputs) -> Self {
        GitHubCompare::new(inputs.api_url.clone(), inputs.token.clone())
    }

    /// The endpoint URL for `request`.
    pub fn compare_url(&self, request: &CompareRequest) -> String {
        compare_url(&self.api_url, request)
    }
}

impl ChangedPathsSource for GitHubCompare {
    fn changed_paths(&self, request: &CompareRequest) -> Result<Vec<String>, SourceError> {
        let url = self.compare_url(request);
        tracing::debug!(%url, authenticated = self.token.is_some(), "comparing commits");

        let mut builder = self
            .agent
            .get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", concat!("changeglob/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let mut response = builder.call().map_err(|e| match e {
            ureq::Error::StatusCode(status) => SourceError::Status {
                url: url.clone(),
                status,
            },
            other => SourceError::Transport {
                url: url.clone(),
                message: other.to_string(),
            },
        })?;

        let comparison: Comparison =
            response
                .body_mut()
                .read_json()
                .map_err(|e| SourceError::Decode {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

        let paths = comparison.into_paths();
        tracing::info!(count = paths.len(), "listed changed paths");
        Ok(paths)
    }
}

fn compare_url(api_url: &str, request: &CompareRequest) -> String {
    format!(
        "{}/repos/{}/{}/compare/{}...{}",
        api_url.trim_end_matches('/'),
        request.owner,
        request.repo,
        request.base,
        request.head
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Answer one request on a local port. The handle yields the request head,
    /// lower-cased.
    fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let api_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut chunk = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&chunk[..n]);
            }
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
            String::from_utf8_lossy(&head).to_lowercase()
        });
        (api_url, handle)
    }

    fn request() -> CompareRequest {
        CompareRequest {
            owner: "actions-go".to_string(),
            repo: "toolkit".to_string(),
            base: "f69adcd6".to_string(),
            head: "dd77f914".to_string(),
        }
    }

    #[test]
    fn test_compare_url() {
        assert_eq!(
            compare_url("https://api.github.com", &request()),
            "https://api.github.com/repos/actions-go/toolkit/compare/f69adcd6...dd77f914"
        );
    }

    #[test]
    fn test_compare_url_enterprise_trailing_slash() {
        let client = GitHubCompare::new("https://ghe.example.com/api/v3/", None);
        assert_eq!(
            client.compare_url(&request()),
            "https://ghe.example.com/api/v3/repos/actions-go/toolkit/compare/f69adcd6...dd77f914"
        );
    }

    #[test]
    fn test_comparison_paths_keep_response_order() {
        let json = r#"{
            "status": "ahead",
            "files": [
                {"filename": "github/github.go", "status": "modified"},
                {"filename": "github/github_test.go", "status": "modified"}
            ]
        }"#;
        let comparison: Comparison = serde_json::from_str(json).unwrap();
        assert_eq!(
            comparison.into_paths(),
            vec!["github/github.go", "github/github_test.go"]
        );
    }

    #[test]
    fn test_comparison_without_files() {
        let comparison: Comparison = serde_json::from_str(r#"{"status":"identical"}"#).unwrap();
        assert!(comparison.into_paths().is_empty());
    }

    #[test]
    fn test_changed_paths_decodes_files_in_order() {
        let (api_url, server) = serve_once(
            "200 OK",
            r#"{"status":"ahead","files":[{"filename":"b.go"},{"filename":"a.go"}]}"#,
        );
        let client = GitHubCompare::new(api_url, Some("tok".to_string()));

        let paths = client.changed_paths(&request()).unwrap();
        assert_eq!(paths, vec!["b.go", "a.go"]);

        let head = server.join().unwrap();
        assert!(head.starts_with("get /repos/actions-go/toolkit/compare/f69adcd6...dd77f914 "));
        assert!(head.contains("authorization: bearer tok\r\n"));
        assert!(head.contains("accept: application/vnd.github+json\r\n"));
        assert!(head.contains("x-github-api-version: 2022-11-28\r\n"));
        assert!(head.contains("user-agent: changeglob/"));
    }

    #[test]
    fn test_anonymous_request_has_no_authorization() {
        let (api_url, server) = serve_once("200 OK", r#"{"files":[]}"#);
        let client = GitHubCompare::new(api_url, None);

        assert!(client.changed_paths(&request()).unwrap().is_empty());
        assert!(!server.join().unwrap().contains("authorization:"));
    }

    #[test]
    fn test_not_found_is_a_status_error() {
        let (api_url, server) = serve_once("404 Not Found", r#"{"message":"Not Found"}"#);
        let client = GitHubCompare::new(api_url, None);

        let err = client.changed_paths(&request()).unwrap_err();
        server.join().unwrap();
        match err {
            SourceError::Status { url, status } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/compare/f69adcd6...dd77f914"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_unexpected_body_is_a_decode_error() {
        let (api_url, server) = serve_once("200 OK", r#"{"files":"nope"}"#);
        let client = GitHubCompare::new(api_url, None);

        let err = client.changed_paths(&request()).unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, SourceError::Decode { .. }));
    }

    #[test]
    fn test_unreachable_api_is_a_transport_error() {
        let client = GitHubCompare::new("http://127.0.0.1:1", None);
        let err = client.changed_paths(&request()).unwrap_err();
        assert!(matches!(err, SourceError::Transport { .. }));
    }
}
