//! Pattern compilation for changed-path matching.
//!
//! A pattern arrives as a raw string plus a mode flag. In [`PatternMode::Regex`]
//! the string is compiled as-is. In [`PatternMode::Glob`] it is validated with
//! `globset`, translated into an anchored regex by [`glob_to_regex`], and then
//! compiled.
//!
//! ## Glob Syntax
//!
//! - `*` matches any run of characters within one path segment
//! - `**` matches any run of characters, crossing `/`
//! - `?` matches one character other than `/`
//! - `[...]` character classes are passed to the regex engine unchanged
//! - `\c` matches `c` literally
//! - `{` and `}` are plain characters; there is no alternation

use std::fmt;

use globset::GlobBuilder;
use regex::Regex;
use thiserror::Error;

/// Error type for pattern compilation.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The glob is not syntactically valid.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// The regular expression does not compile.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A valid glob was translated into a regex that does not compile.
    #[error("glob '{glob}' translated to invalid regex '{regex}': {source}")]
    Translation {
        glob: String,
        regex: String,
        #[source]
        source: regex::Error,
    },
}

/// How the raw pattern string is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PatternMode {
    /// Regular expression, compiled as written.
    #[default]
    Regex,
    /// Path glob, translated to an anchored regular expression.
    Glob,
}

impl PatternMode {
    /// Map the `use-glob` flag to a mode.
    pub fn from_use_glob(use_glob: bool) -> Self {
        if use_glob {
            PatternMode::Glob
        } else {
            PatternMode::Regex
        }
    }
}

impl fmt::Display for PatternMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternMode::Regex => write!(f, "regex"),
            PatternMode::Glob => write!(f, "glob"),
        }
    }
}

/// A compiled, immutable path matcher.
///
/// Cheap to share: the inner [`Regex`] is `Send + Sync`, so one matcher can
/// serve any number of callers.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    regex: Regex,
    mode: PatternMode,
}

impl CompiledMatcher {
    /// Compile `raw` according to `mode`.
    pub fn compile(raw: &str, mode: PatternMode) -> Result<Self, PatternError> {
        let regex = match mode {
            PatternMode::Regex => Regex::new(raw).map_err(|source| PatternError::InvalidPattern {
                pattern: raw.to_string(),
                source,
            })?,
            PatternMode::Glob => {
                validate_glob(raw)?;
                let translated = glob_to_regex(raw);
                Regex::new(&translated).map_err(|source| {
                    tracing::error!(
                        glob = raw,
                        regex = %translated,
                        "glob translation produced an invalid regex: {}",
                        source
                    );
                    PatternError::Translation {
                        glob: raw.to_string(),
                        regex: translated.clone(),
                        source,
                    }
                })?
            }
        };

        tracing::debug!(mode = %mode, regex = regex.as_str(), "compiled pattern");
        Ok(CompiledMatcher { regex, mode })
    }

    /// Check whether `path` satisfies the pattern.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// The regex source actually used for matching.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// The mode this matcher was compiled in.
    pub fn mode(&self) -> PatternMode {
        self.mode
    }
}

/// Compile a raw pattern, choosing the mode from the `use-glob` flag.
pub fn compile(raw: &str, use_glob: bool) -> Result<CompiledMatcher, PatternError> {
    CompiledMatcher::compile(raw, PatternMode::from_use_glob(use_glob))
}

/// Reject globs the native glob matcher cannot build.
fn validate_glob(raw: &str) -> Result<(), PatternError> {
    GlobBuilder::new(&literal_braces(raw))
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map(|_| ())
        .map_err(|e| PatternError::InvalidGlob {
            pattern: raw.to_string(),
            message: e.kind().to_string(),
        })
}

/// Rewrite braces outside character classes as one-character classes.
///
/// `globset` reads `{a,b}` as alternation; here braces are literals.
fn literal_braces(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 4);
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '[' => {
                out.push(c);
                if let Some(negation) = chars.next_if(|&n| n == '!' || n == '^') {
                    out.push(negation);
                }
                if let Some(bracket) = chars.next_if_eq(&']') {
                    out.push(bracket);
                }
                for inner in chars.by_ref() {
                    out.push(inner);
                    if inner == ']' {
                        break;
                    }
                }
            }
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            other => out.push(other),
        }
    }
    out
}

/// Whether `rest`, the text after a `{`, completes a counted repetition
/// such as `{2}`, `{2,}` or `{2,5}`.
fn opens_repetition(mut rest: impl Iterator<Item = char>) -> bool {
    let mut digits = 0;
    let mut next = rest.next();
    while matches!(next, Some(c) if c.is_ascii_digit()) {
        digits += 1;
        next = rest.next();
    }
    if digits == 0 {
        return false;
    }
    if next == Some(',') {
        next = rest.next();
        while matches!(next, Some(c) if c.is_ascii_digit()) {
            next = rest.next();
        }
    }
    next == Some('}')
}

/// Translate a glob into an anchored regular expression source string.
///
/// The output is not validated; characters with no glob meaning are copied
/// through, so regex metacharacters such as `+` or `(` keep their regex
/// meaning. A `{` that does not start a counted repetition is escaped, since
/// it can only be a literal brace.
pub fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');

    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('{') => push_brace(&mut out, chars.clone()),
                Some(escaped) => {
                    if matches!(escaped, '*' | '?' | '\\' | '[') {
                        out.push('\\');
                    }
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            '.' => out.push_str(r"\."),
            '?' => out.push_str("[^/]"),
            '*' => {
                if chars.next_if_eq(&'*').is_some() {
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '{' => push_brace(&mut out, chars.clone()),
            other => out.push(other),
        }
    }

    out.push('$');
    out
}

fn push_brace(out: &mut String, rest: impl Iterator<Item = char>) {
    if !opens_repetition(rest) {
        out.push('\\');
    }
    out.push('{');
}
