// src/command/result_data.rs

//! Output and error aggregation for a single execution.

use std::ops::Deref;

use tracing::warn;

use crate::errno::{Error, SUCCESS_CODE};

/// Append-only, ordered list of [`Error`] records.
///
/// There is intentionally no way to remove, reorder or replace entries.
#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Vec<Error>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, error: Error) {
        self.entries.push(error);
    }

    pub fn as_slice(&self) -> &[Error] {
        &self.entries
    }
}

impl Deref for ErrorLog {
    type Target = [Error];

    fn deref(&self) -> &[Error] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a ErrorLog {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// stdout / stderr / exit code / internal errors of one execution.
#[derive(Debug, Clone, Default)]
pub struct ResultData {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    errors: ErrorLog,
}

impl ResultData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn append_stdout(&mut self, text: &str) {
        self.stdout.push_str(text);
    }

    pub fn append_stdout_ln(&mut self, text: &str) {
        self.stdout.push_str(text);
        self.stdout.push('\n');
    }

    pub fn prepend_stdout(&mut self, text: &str) {
        self.stdout.insert_str(0, text);
    }

    pub fn prepend_stdout_ln(&mut self, text: &str) {
        self.stdout.insert(0, '\n');
        self.stdout.insert_str(0, text);
    }

    pub fn clear_stdout(&mut self) {
        self.stdout.clear();
    }

    pub fn append_stderr(&mut self, text: &str) {
        self.stderr.push_str(text);
    }

    pub fn append_stderr_ln(&mut self, text: &str) {
        self.stderr.push_str(text);
        self.stderr.push('\n');
    }

    pub fn prepend_stderr(&mut self, text: &str) {
        self.stderr.insert_str(0, text);
    }

    pub fn prepend_stderr_ln(&mut self, text: &str) {
        self.stderr.insert(0, '\n');
        self.stderr.insert_str(0, text);
    }

    pub fn clear_stderr(&mut self) {
        self.stderr.clear();
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Record the process exit code. Only the first call has an effect.
    pub fn set_exit_code(&mut self, code: i32) -> bool {
        match self.exit_code {
            Some(existing) => {
                warn!(
                    existing,
                    rejected = code,
                    "exit code already recorded; ignoring new value"
                );
                false
            }
            None => {
                self.exit_code = Some(code);
                true
            }
        }
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Append an error record. Returns whether the record is a failure.
    ///
    /// Only reachable through `ExecutionCommand`, which keeps the command
    /// state in step with the error list.
    pub(crate) fn set_state_failed(&mut self, error: Error) -> bool {
        let failed = error.is_state_failed();
        if !failed {
            warn!(
                code = error.code(),
                message = %error.message(),
                "recording an error whose code is not a failure code"
            );
        }
        self.errors.push(error);
        failed
    }

    pub fn is_state_failed(&self) -> bool {
        self.errors.iter().any(Error::is_state_failed)
    }

    /// Code of the most recently appended failed error, or the success code.
    pub fn err_code(&self) -> i32 {
        self.errors
            .iter()
            .rev()
            .find(|e| e.is_state_failed())
            .map(Error::code)
            .unwrap_or(SUCCESS_CODE)
    }

    /// All failed errors, one block per error, oldest first.
    pub fn errors_log_string(&self) -> String {
        self.errors
            .iter()
            .filter(|e| e.is_state_failed())
            .map(Error::log_string)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
