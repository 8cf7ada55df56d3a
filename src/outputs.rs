//! Writing step outputs and annotations for the Actions runner.
//!
//! Two sinks are provided: [`GithubOutputFile`] appends to the file named by
//! `GITHUB_OUTPUT`, and [`WorkflowCommands`] prints the legacy
//! `::set-output` commands for runners that do not set it.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use changeglob_core::FilterResult;

/// Output name for the boolean flag.
pub const MODIFIED: &str = "modified";

/// Output name for the matching path list.
pub const MODIFIED_FILES: &str = "modified-files";

/// Destination for named step outputs.
pub trait OutputSink {
    /// Record `value` under `name`.
    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()>;
}

/// Appends `name=value` records to a `GITHUB_OUTPUT` file.
#[derive(Debug)]
pub struct GithubOutputFile {
    path: PathBuf,
    file: File,
}

impl GithubOutputFile {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(GithubOutputFile { path, file })
    }

    /// The file being written.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for GithubOutputFile {
    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        if value.contains('\n') || value.contains('\r') {
            let delimiter = heredoc_delimiter(value);
            writeln!(self.file, "{}<<{}\n{}\n{}", name, delimiter, value, delimiter)?;
        } else {
            writeln!(self.file, "{}={}", name, value)?;
        }
        self.file.flush()
    }
}

/// Prints `::set-output` workflow commands.
#[derive(Debug)]
pub struct WorkflowCommands<W: Write> {
    writer: W,
}

impl<W: Write> WorkflowCommands<W> {
    pub fn new(writer: W) -> Self {
        WorkflowCommands { writer }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for WorkflowCommands<W> {
    fn set_output(&mut self, name: &str, value: &str) -> io::Result<()> {
        writeln!(
            self.writer,
            "::set-output name={}::{}",
            escape_property(name),
            escape_data(value)
        )?;
        self.writer.flush()
    }
}

/// Write both outputs for `result`.
pub fn write_result(sink: &mut dyn OutputSink, result: &FilterResult) -> io::Result<()> {
    let files = result
        .modified_files_json()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    sink.set_output(MODIFIED, &result.modified_json())?;
    sink.set_output(MODIFIED_FILES, &files)
}

/// Print an `::error::` annotation.
pub fn annotate_error(writer: &mut impl Write, message: &str) -> io::Result<()> {
    writeln!(writer, "::error::{}", escape_data(message))?;
    writer.flush()
}

/// Escape a command value.
pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a command property.
pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// A heredoc delimiter that does not occur in `value`.
fn heredoc_delimiter(value: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let mut delimiter = format!("ghadelimiter_{}_{:x}", std::process::id(), nanos);
    while value.contains(&delimiter) {
        delimiter.push('_');
    }
    delimiter
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_workflow_commands_output() {
        let mut sink = WorkflowCommands::new(Vec::<u8>::new());
        let result = FilterResult::from_matches(vec!["github/github_test.go".to_string()]);
        write_result(&mut sink, &result).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains("::set-output name=modified::true\n"));
        assert!(out.contains(r#"::set-output name=modified-files::["github/github_test.go"]"#));
    }

    #[test]
    fn test_workflow_commands_empty_result() {
        let mut sink = WorkflowCommands::new(Vec::<u8>::new());
        write_result(&mut sink, &FilterResult::empty()).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "::set-output name=modified::false\n::set-output name=modified-files::[]\n"
        );
    }

    #[test]
    fn test_github_output_file_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output");
        fs::write(&path, "earlier=1\n").unwrap();

        let mut sink = GithubOutputFile::open(&path).unwrap();
        assert_eq!(sink.path(), path.as_path());
        write_result(&mut sink, &FilterResult::from_matches(vec!["a.go".to_string()])).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "earlier=1\nmodified=true\nmodified-files=[\"a.go\"]\n");
    }

    #[test]
    fn test_github_output_file_multiline_uses_heredoc() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output");

        let mut sink = GithubOutputFile::open(&path).unwrap();
        sink.set_output("note", "line one\nline two").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        let header = lines.next().unwrap();
        let delimiter = header.strip_prefix("note<<").unwrap();
        assert_eq!(lines.next(), Some("line one"));
        assert_eq!(lines.next(), Some("line two"));
        assert_eq!(lines.next(), Some(delimiter));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_escape_data() {
        assert_eq!(escape_data("50%\r\ndone"), "50%25%0D%0Adone");
    }

    #[test]
    fn test_escape_property() {
        assert_eq!(escape_property("a:b,c"), "a%3Ab%2Cc");
    }

    #[test]
    fn test_annotate_error() {
        let mut out: Vec<u8> = Vec::new();
        annotate_error(&mut out, "invalid pattern '[':\nunclosed").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "::error::invalid pattern '[':%0Aunclosed\n"
        );
    }
}
