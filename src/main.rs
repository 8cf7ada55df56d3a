//! Binary entry point for the changeglob CLI.
//!
//! Runs as a GitHub Actions step: inputs arrive as `INPUT_*` environment
//! variables, outputs go to `GITHUB_OUTPUT` (or `::set-output` commands when
//! that is unset). Every input can also be passed as a flag.
//!
//! ## Usage
//!
//! ```bash
//! # Did any test file change between two commits?
//! changeglob --pattern '**/*_test.go' --use-glob \
//!     --repository octo/hello --base main --head feature --format json
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, ValueEnum};

use changeglob::error::{ChangeglobError, OutputErrorCode};
use changeglob::event::EventPayload;
use changeglob::github::GitHubCompare;
use changeglob::inputs::{ActionInputs, RawInputs};
use changeglob::output::{emit_response, ErrorResponse};
use changeglob::outputs::{GithubOutputFile, OutputSink, WorkflowCommands};
use changeglob::run::{fail, run, RunOutcome};

// ============================================================================
// CLI Structure
// ============================================================================

/// Report whether files matching a pattern changed between two commits.
#[derive(Parser, Debug)]
#[command(name = "changeglob", version, about)]
struct Cli {
    #[command(flatten)]
    inputs: InputArgs,

    /// Webhook payload used to default `base` and `head`.
    #[arg(long, env = "GITHUB_EVENT_PATH")]
    event_path: Option<PathBuf>,

    /// File that receives step outputs.
    #[arg(long, env = "GITHUB_OUTPUT")]
    github_output: Option<PathBuf>,

    /// Report format on stdout.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Action inputs, each readable from its `INPUT_*` variable.
#[derive(Args, Debug)]
struct InputArgs {
    /// Regex, or glob with --use-glob, matched against changed paths.
    #[arg(long, env = "INPUT_PATTERN")]
    pattern: Option<String>,

    /// Interpret the pattern as a glob.
    #[arg(
        long,
        env = "INPUT_USE-GLOB",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    use_glob: Option<String>,

    /// Base revision (default: from the event payload).
    #[arg(long, env = "INPUT_BASE")]
    base: Option<String>,

    /// Head revision (default: from the event payload).
    #[arg(long, env = "INPUT_HEAD")]
    head: Option<String>,

    /// Repository owner (default: from GITHUB_REPOSITORY).
    #[arg(long, env = "INPUT_OWNER")]
    owner: Option<String>,

    /// Repository name (default: from GITHUB_REPOSITORY).
    #[arg(long, env = "INPUT_REPO")]
    repo: Option<String>,

    /// API token.
    #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide = true, hide_env_values = true)]
    github_token_input: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide = true, hide_env_values = true)]
    github_token: Option<String>,

    /// Repository as owner/repo.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: Option<String>,

    /// REST API base URL.
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,
}

impl InputArgs {
    fn into_raw(self) -> RawInputs {
        RawInputs {
            pattern: self.pattern,
            use_glob: self.use_glob,
            base: self.base,
            head: self.head,
            owner: self.owner,
            repo: self.repo,
            tokens: vec![self.token, self.github_token_input, self.github_token],
            repository: self.repository,
            api_url: self.api_url,
        }
    }
}

/// Report format on stdout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Workflow commands only (default).
    #[default]
    Text,
    /// JSON report.
    Json,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level);

    let format = cli.format;
    // Annotations share stdout with workflow commands; keep JSON reports clean.
    let mut annotations: Box<dyn Write> = match format {
        OutputFormat::Text => Box::new(io::stdout()),
        OutputFormat::Json => Box::new(io::sink()),
    };

    match execute(cli, &mut annotations) {
        Ok(outcome) => {
            if format == OutputFormat::Json {
                let _ = emit_response(&outcome.response(), &mut io::stdout());
            }
            match outcome.lookup_failure() {
                Some(err) => ExitCode::from(OutputErrorCode::from(&err).code()),
                None => ExitCode::SUCCESS,
            }
        }
        Err(err) => {
            if format == OutputFormat::Json {
                let _ = emit_response(&ErrorResponse::from_error(&err), &mut io::stdout());
            }
            let _ = io::stdout().flush();
            ExitCode::from(OutputErrorCode::from(&err).code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Resolve inputs, look up changed paths, and write outputs.
fn execute<W: Write>(cli: Cli, annotations: &mut W) -> Result<RunOutcome, ChangeglobError> {
    let mut sink = open_sink(cli.github_output.as_deref(), cli.format)?;

    let resolved = EventPayload::load(cli.event_path.as_deref())
        .map_err(ChangeglobError::from)
        .and_then(|payload| {
            ActionInputs::resolve(&cli.inputs.into_raw(), &payload).map_err(ChangeglobError::from)
        });
    let inputs = match resolved {
        Ok(inputs) => inputs,
        Err(err) => {
            fail(&err, sink.as_mut(), annotations);
            return Err(err);
        }
    };

    let source = GitHubCompare::from_inputs(&inputs);
    run(&inputs, &source, sink.as_mut(), annotations)
}

/// Pick the output sink for this runner.
fn open_sink(
    github_output: Option<&Path>,
    format: OutputFormat,
) -> Result<Box<dyn OutputSink>, ChangeglobError> {
    match (github_output, format) {
        (Some(path), _) if !path.as_os_str().is_empty() => {
            let file = GithubOutputFile::open(path).map_err(|e| {
                ChangeglobError::output_failed(path.display().to_string(), e.to_string())
            })?;
            Ok(Box::new(file))
        }
        (_, OutputFormat::Text) => Ok(Box::new(WorkflowCommands::new(io::stdout()))),
        (_, OutputFormat::Json) => Ok(Box::new(WorkflowCommands::new(io::sink()))),
    }
}

// ============================================================================
// Tests
// ============================================================================
