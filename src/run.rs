//! One invocation of the action: compile, look up, filter, report.

use std::io::Write;

use changeglob_core::error::ChangeglobError;
use changeglob_core::output::MatchResponse;
use changeglob_core::{CompiledMatcher, FilterResult};

use crate::github::{ChangedPathsSource, CompareRequest, SourceError};
use crate::inputs::ActionInputs;
use crate::outputs::{annotate_error, write_result, OutputSink, MODIFIED};

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// The filtered paths, also written to the sink.
    pub result: FilterResult,
    /// Set when the changed-path lookup failed and an empty list was filtered.
    pub lookup_error: Option<SourceError>,
}

impl RunOutcome {
    /// The JSON report for this outcome.
    pub fn response(&self) -> MatchResponse {
        let response = MatchResponse::new(&self.result);
        match &self.lookup_error {
            Some(err) => response.with_lookup_error(err.to_string()),
            None => response,
        }
    }

    /// The error to exit with, if the lookup failed.
    pub fn lookup_failure(&self) -> Option<ChangeglobError> {
        self.lookup_error
            .as_ref()
            .map(|err| ChangeglobError::lookup_failed(err.to_string()))
    }
}

/// Run the action for `inputs`.
///
/// A pattern that does not compile aborts the run before any lookup. A lookup
/// failure is annotated and treated as zero changed paths; it is returned in
/// the outcome rather than as an error so the outputs still get written.
pub fn run<W: Write>(
    inputs: &ActionInputs,
    source: &dyn ChangedPathsSource,
    sink: &mut dyn OutputSink,
    annotations: &mut W,
) -> Result<RunOutcome, ChangeglobError> {
    let matcher = match CompiledMatcher::compile(&inputs.pattern, inputs.mode) {
        Ok(matcher) => matcher,
        Err(err) => {
            let err = ChangeglobError::from(err);
            fail(&err, sink, annotations);
            return Err(err);
        }
    };

    let request = CompareRequest::from_inputs(inputs);
    let (paths, lookup_error) = match source.changed_paths(&request) {
        Ok(paths) => (paths, None),
        Err(err) => {
            tracing::error!("failed to compare commits through the API: {}", err);
            report_annotation(
                annotations,
                &format!("failed to compare commits through the API: {}", err),
            );
            (Vec::new(), Some(err))
        }
    };

    let result = FilterResult::from_paths(&matcher, &paths);
    tracing::info!(
        modified = result.modified,
        matched = result.modified_files.len(),
        "pattern applied to changed paths"
    );

    write_result(sink, &result)
        .map_err(|e| ChangeglobError::output_failed(MODIFIED, e.to_string()))?;

    Ok(RunOutcome {
        result,
        lookup_error,
    })
}

/// Report `err` and write empty outputs so downstream steps read `modified=false`.
pub fn fail<W: Write>(err: &ChangeglobError, sink: &mut dyn OutputSink, annotations: &mut W) {
    tracing::error!("{}", err);
    report_annotation(annotations, &err.to_string());
    if let Err(io_err) = write_result(sink, &FilterResult::empty()) {
        tracing::warn!("could not write empty outputs after failure: {}", io_err);
    }
}

fn report_annotation<W: Write>(annotations: &mut W, message: &str) {
    if let Err(e) = annotate_error(annotations, message) {
        tracing::warn!("could not write error annotation: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io;

    use changeglob_core::error::OutputErrorCode;
    use changeglob_core::PatternMode;

    use crate::outputs::WorkflowCommands;

    struct FixedSource {
        paths: Vec<String>,
        calls: Cell<usize>,
    }

    impl FixedSource {
        fn new(paths: &[&str]) -> Self {
            FixedSource {
                paths: paths.iter().map(|p| p.to_string()).collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl ChangedPathsSource for FixedSource {
        fn changed_paths(&self, _request: &CompareRequest) -> Result<Vec<String>, SourceError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.paths.clone())
        }
    }

    struct FailingSource;

    impl ChangedPathsSource for FailingSource {
        fn changed_paths(&self, _request: &CompareRequest) -> Result<Vec<String>, SourceError> {
            Err(SourceError::Status {
                url: "https://api.github.com/repos/o/r/compare/a...b".to_string(),
                status: 404,
            })
        }
    }

    struct BrokenSink;

    impl OutputSink for BrokenSink {
        fn set_output(&mut self, _name: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::other("closed"))
        }
    }

    fn inputs(pattern: &str, mode: PatternMode) -> ActionInputs {
        ActionInputs {
            pattern: pattern.to_string(),
            mode,
            base: "f69adcd6".to_string(),
            head: "dd77f914".to_string(),
            owner: "actions-go".to_string(),
            repo: "toolkit".to_string(),
            token: None,
            api_url: "https://api.github.com".to_string(),
        }
    }

    fn sink_text(sink: WorkflowCommands<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_run_glob_end_to_end() {
        let source = FixedSource::new(&["github/github.go", "github/github_test.go"]);
        let mut sink = WorkflowCommands::new(Vec::<u8>::new());
        let mut annotations: Vec<u8> = Vec::new();

        let outcome = run(
            &inputs("**/*_test.go", PatternMode::Glob),
            &source,
            &mut sink,
            &mut annotations,
        )
        .unwrap();

        assert!(outcome.result.modified);
        assert_eq!(outcome.result.modified_files, vec!["github/github_test.go"]);
        assert!(outcome.lookup_failure().is_none());
        let out = sink_text(sink);
        assert!(out.contains("::set-output name=modified::true"));
        assert!(out.contains(r#"::set-output name=modified-files::["github/github_test.go"]"#));
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_run_same_pattern_in_regex_mode_is_invalid() {
        let source = FixedSource::new(&["some/path/pkg_test.go"]);
        let mut sink = WorkflowCommands::new(Vec::<u8>::new());
        let mut annotations: Vec<u8> = Vec::new();

        let err = run(
            &inputs("**/*_test.go", PatternMode::Regex),
            &source,
            &mut sink,
            &mut annotations,
        )
        .unwrap_err();

        assert_eq!(OutputErrorCode::from(&err), OutputErrorCode::InvalidArguments);
        assert_eq!(source.calls.get(), 0);
        assert!(sink_text(sink).contains("::set-output name=modified-files::[]"));
    }

    #[test]
    fn test_run_invalid_regex_writes_empty_outputs() {
        let source = FixedSource::new(&["some/path/pkg_test.go"]);
        let mut sink = WorkflowCommands::new(Vec::<u8>::new());
        let mut annotations: Vec<u8> = Vec::new();

        let err = run(
            &inputs("[", PatternMode::Regex),
            &source,
            &mut sink,
            &mut annotations,
        )
        .unwrap_err();

        assert!(matches!(err, ChangeglobError::Pattern(_)));
        assert_eq!(source.calls.get(), 0);
        assert_eq!(
            sink_text(sink),
            "::set-output name=modified::false\n::set-output name=modified-files::[]\n"
        );
        assert!(String::from_utf8(annotations)
            .unwrap()
            .starts_with("::error::invalid pattern '['"));
    }

    #[test]
    fn test_run_glob_without_match() {
        let source = FixedSource::new(&["some/path/pkg.go"]);
        let mut sink = WorkflowCommands::new(Vec::<u8>::new());

        let outcome = run(
            &inputs("**/*_test.go", PatternMode::Glob),
            &source,
            &mut sink,
            &mut io::sink(),
        )
        .unwrap();

        assert!(!outcome.result.modified);
        assert!(outcome.result.modified_files.is_empty());
    }

    #[test]
    fn test_run_lookup_failure_filters_nothing() {
        let mut sink = WorkflowCommands::new(Vec::<u8>::new());
        let mut annotations: Vec<u8> = Vec::new();

        let outcome = run(
            &inputs("", PatternMode::Regex),
            &FailingSource,
            &mut sink,
            &mut annotations,
        )
        .unwrap();

        assert_eq!(outcome.result, FilterResult::empty());
        let failure = outcome.lookup_failure().unwrap();
        assert_eq!(OutputErrorCode::from(&failure), OutputErrorCode::LookupFailed);
        assert!(outcome.response().lookup_error.unwrap().contains("HTTP 404"));
        assert!(sink_text(sink).contains("::set-output name=modified::false"));
        assert!(String::from_utf8(annotations)
            .unwrap()
            .starts_with("::error::failed to compare commits through the API"));
    }

    #[test]
    fn test_run_output_failure() {
        let source = FixedSource::new(&["a.go"]);
        let err = run(
            &inputs("", PatternMode::Regex),
            &source,
            &mut BrokenSink,
            &mut io::sink(),
        )
        .unwrap_err();
        assert_eq!(OutputErrorCode::from(&err), OutputErrorCode::OutputFailed);
    }

    #[test]
    fn test_run_is_repeatable() {
        let source = FixedSource::new(&["b_test.go", "a_test.go", "c.go"]);
        let inputs = inputs("*_test.go", PatternMode::Glob);

        let first = run(&inputs, &source, &mut WorkflowCommands::new(Vec::<u8>::new()), &mut io::sink())
            .unwrap();
        let second = run(&inputs, &source, &mut WorkflowCommands::new(Vec::<u8>::new()), &mut io::sink())
            .unwrap();

        assert_eq!(first.result, second.result);
        assert_eq!(first.result.modified_files, vec!["b_test.go", "a_test.go"]);
    }
}
