// src/errno.rs

//! Typed error records attached to an execution command.
//!
//! These are *data*, not Rust errors: the runner never returns them across
//! its boundary. They are appended to a command's [`ResultData`] and the
//! caller inspects them after the command is finalized.
//!
//! [`ResultData`]: crate::command::ResultData

use std::fmt;
use std::sync::Arc;

/// Code used by [`Error`] to mean "no failure".
pub const SUCCESS_CODE: i32 = 0;

/// A single error record: classification, numeric code, message and the
/// underlying causes (if any).
///
/// Fields are private and there are no setters; a new failure is always a new
/// `Error`.
#[derive(Debug, Clone)]
pub struct Error {
    kind: Option<String>,
    code: i32,
    message: String,
    causes: Vec<Arc<anyhow::Error>>,
}

impl Error {
    pub fn new(kind: Option<String>, code: i32, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
            causes: Vec::new(),
        }
    }

    /// Attach a cause. Consumes `self` so records stay immutable once shared.
    pub fn with_cause(mut self, cause: impl Into<anyhow::Error>) -> Self {
        self.causes.push(Arc::new(cause.into()));
        self
    }

    pub fn with_causes(mut self, causes: impl IntoIterator<Item = anyhow::Error>) -> Self {
        self.causes.extend(causes.into_iter().map(Arc::new));
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn causes(&self) -> &[Arc<anyhow::Error>] {
        &self.causes
    }

    pub fn is_state_failed(&self) -> bool {
        self.code != SUCCESS_CODE
    }

    /// Multi-line rendering including the cause chains, as written to
    /// `errmsg` result files.
    pub fn log_string(&self) -> String {
        let mut out = format!(
            "({}) {}: {}",
            self.kind.as_deref().unwrap_or("Error"),
            self.code,
            self.message
        );
        for cause in &self.causes {
            out.push_str("\n  caused by: ");
            out.push_str(&format!("{cause:#}"));
        }
        out
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{kind} {}: {}", self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Catalog entry describing one kind of error.
///
/// `message` is a template where every `{}` is replaced, in order, by the
/// arguments passed to [`Errno::error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno {
    pub kind: &'static str,
    pub code: i32,
    pub message: &'static str,
}

impl Errno {
    pub const fn new(kind: &'static str, code: i32, message: &'static str) -> Self {
        Self {
            kind,
            code,
            message,
        }
    }

    pub const EXECUTABLE_NOT_FOUND: Errno = Errno::new(
        "ShellError",
        100,
        "No executable found for \"{}\": no login shell on the search path and the fallback shell \"{}\" is not executable",
    );
    pub const INVALID_WORKING_DIRECTORY: Errno = Errno::new(
        "ShellError",
        101,
        "The working directory \"{}\" for \"{}\" does not exist or is not a directory",
    );
    pub const INVALID_STATE_TRANSITION: Errno = Errno::new(
        "ShellError",
        102,
        "Invalid state transition for \"{}\" from \"{}\" to \"{}\"",
    );
    pub const SPAWN_FAILED: Errno =
        Errno::new("ShellError", 103, "Failed to spawn process \"{}\" for \"{}\"");
    pub const PROCESS_KILLED: Errno = Errno::new(
        "ShellError",
        104,
        "The process for \"{}\" was forcibly terminated",
    );
    pub const INVALID_EXECUTABLE_URI: Errno = Errno::new(
        "ShellError",
        105,
        "The executable uri \"{}\" is not a valid file uri",
    );

    pub const RESULT_FILE_BASENAME_INVALID: Errno = Errno::new(
        "ResultSenderError",
        200,
        "The result file basename \"{}\" is empty or contains a \"/\"",
    );
    pub const RESULT_FILES_SUFFIX_INVALID: Errno = Errno::new(
        "ResultSenderError",
        201,
        "The result files suffix \"{}\" contains a \"/\"",
    );
    pub const RESULT_DIRECTORY_INVALID: Errno = Errno::new(
        "ResultSenderError",
        202,
        "The result directory \"{}\" could not be created or is not a directory",
    );
    pub const RESULT_WRITE_FAILED: Errno =
        Errno::new("ResultSenderError", 203, "Failed to write result file \"{}\"");

    /// Build an [`Error`] from this entry, filling the message template.
    pub fn error(&self, args: &[&dyn fmt::Display]) -> Error {
        Error::new(Some(self.kind.to_string()), self.code, fill_template(self.message, args))
    }

    /// Build an [`Error`] carrying `cause`.
    pub fn error_with_cause(
        &self,
        args: &[&dyn fmt::Display],
        cause: impl Into<anyhow::Error>,
    ) -> Error {
        self.error(args).with_cause(cause)
    }
}

fn fill_template(template: &str, args: &[&dyn fmt::Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;

    while let Some(idx) = rest.find("{}") {
        out.push_str(&rest[..idx]);
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("-"),
        }
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: [Errno; 10] = [
        Errno::EXECUTABLE_NOT_FOUND,
        Errno::INVALID_WORKING_DIRECTORY,
        Errno::INVALID_STATE_TRANSITION,
        Errno::SPAWN_FAILED,
        Errno::PROCESS_KILLED,
        Errno::INVALID_EXECUTABLE_URI,
        Errno::RESULT_FILE_BASENAME_INVALID,
        Errno::RESULT_FILES_SUFFIX_INVALID,
        Errno::RESULT_DIRECTORY_INVALID,
        Errno::RESULT_WRITE_FAILED,
    ];

    #[test]
    fn every_catalog_entry_is_a_distinct_failure() {
        let mut codes: Vec<i32> = CATALOG.iter().map(|e| e.code).collect();
        assert!(codes.iter().all(|&c| c != SUCCESS_CODE));
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), CATALOG.len());
        assert!(CATALOG.iter().all(|e| e.error(&[]).is_state_failed()));
    }

    #[test]
    fn missing_template_arguments_render_as_dash() {
        let error = Errno::SPAWN_FAILED.error(&[&"/bin/x"]);
        assert_eq!(error.message(), "Failed to spawn process \"/bin/x\" for \"-\"");
    }
}
