// src/engine/session.rs

//! Pure session core.
//!
//! A [`Session`] binds one [`ExecutionCommand`] to the process spawned for
//! it and implements the termination protocol:
//!
//! - [`Session::on_process_exit`] is called by the process backend when the
//!   process exits on its own.
//! - [`Session::kill_if_executing`] is the forced-termination path (timeout
//!   watchdog, user cancel).
//! - [`Session::finalize`] delivers the result exactly once.
//!
//! Nothing here spawns processes or touches Tokio; the backend in
//! [`crate::exec`] does the IO and calls back into this type.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::command::{ExecutionCommand, ExecutionState};
use crate::engine::client::SessionClient;
use crate::errno::{Errno, Error};
use crate::exec::ProcessControl;
use crate::shell::Invocation;

/// Exit code recorded when a command is forcibly terminated (128 + SIGKILL).
pub const KILLED_EXIT_CODE: i32 = 128 + 9;

/// Which output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Interleaved output of both streams, optionally bounded to the last
/// `max_rows` lines.
#[derive(Debug, Default)]
struct Transcript {
    lines: VecDeque<String>,
    max_rows: Option<usize>,
}

impl Transcript {
    fn new(max_rows: Option<usize>) -> Self {
        Self {
            lines: VecDeque::new(),
            max_rows,
        }
    }

    fn push(&mut self, line: &str) {
        self.lines.push_back(line.to_string());
        if let Some(max) = self.max_rows {
            while self.lines.len() > max {
                self.lines.pop_front();
            }
        }
    }

    fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Runtime unit binding a spawned process to its execution command.
pub struct Session {
    command: Arc<ExecutionCommand>,
    client: Option<Arc<dyn SessionClient>>,
    invocation: OnceLock<Invocation>,
    process: OnceLock<Arc<dyn ProcessControl>>,
    transcript: Mutex<Transcript>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("command", &self.command)
            .field("invocation", &self.invocation.get())
            .field("process", &self.process.get())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(command: Arc<ExecutionCommand>, client: Option<Arc<dyn SessionClient>>) -> Self {
        let rows = command.request().terminal_transcript_rows;
        Self {
            command,
            client,
            invocation: OnceLock::new(),
            process: OnceLock::new(),
            transcript: Mutex::new(Transcript::new(rows)),
        }
    }

    pub fn command(&self) -> &Arc<ExecutionCommand> {
        &self.command
    }

    /// The resolved invocation, once preparation succeeded.
    pub fn invocation(&self) -> Option<&Invocation> {
        self.invocation.get()
    }

    pub fn process(&self) -> Option<&Arc<dyn ProcessControl>> {
        self.process.get()
    }

    pub fn transcript(&self) -> String {
        self.transcript.lock().text()
    }

    pub(crate) fn set_invocation(&self, invocation: Invocation) {
        if self.invocation.set(invocation).is_err() {
            warn!(command = %self.command.label(), "invocation already set; keeping the first");
        }
    }

    /// Bind the spawned process. Must happen before the backend starts
    /// monitoring it, so an exit report always finds the process.
    pub(crate) fn attach_process(&self, process: Arc<dyn ProcessControl>) {
        let pid = process.pid();
        if self.process.set(process).is_err() {
            warn!(command = %self.command.label(), "process already attached; keeping the first");
            return;
        }
        self.command.update(|lc| lc.set_pid(pid));
    }

    /// Record one line of process output.
    ///
    /// Lines always go to the transcript. They go to the result buffers
    /// unless stdout is taken from the transcript, and only until the
    /// command has executed or failed.
    pub fn record_output(&self, stream: OutputStream, line: &str) {
        self.transcript.lock().push(line);

        if self.command.request().stdout_from_transcript {
            return;
        }

        self.command.update(|lc| {
            if lc.has_executed() {
                return;
            }
            match stream {
                OutputStream::Stdout => lc.result_data_mut().append_stdout_ln(line),
                OutputStream::Stderr => lc.result_data_mut().append_stderr_ln(line),
            }
        });
    }

    /// Record an internal failure and finalize.
    pub fn fail(self: &Arc<Self>, error: Error) {
        warn!(command = %self.command.label(), %error, "session failed");
        self.command.set_state_failed(error);
        self.finalize();
    }

    /// Normal exit callback.
    ///
    /// A no-op while the process still reports itself running, and after a
    /// forced termination already failed the command.
    pub fn on_process_exit(self: &Arc<Self>) {
        let Some(process) = self.process.get() else {
            warn!(command = %self.command.label(), "exit reported for a session without a process");
            return;
        };

        if process.is_running() {
            debug!(command = %self.command.label(), "exit callback while process still running; ignoring");
            return;
        }

        let exit_code = process.exit_code().unwrap_or(-1);
        let transcript = self
            .command
            .request()
            .stdout_from_transcript
            .then(|| self.transcript());

        let processed = self.command.update(|lc| {
            if lc.current_state() == ExecutionState::Failed {
                return false;
            }
            lc.result_data_mut().set_exit_code(exit_code);
            if let Some(text) = &transcript {
                lc.result_data_mut().append_stdout(text);
            }
            lc.set_state(ExecutionState::Executed)
        });

        if !processed {
            debug!(
                command = %self.command.label(),
                exit_code,
                "exit callback after the command already failed; ignoring"
            );
            return;
        }

        info!(command = %self.command.label(), exit_code, "process exited");
        self.finalize();
    }

    /// Forced termination. Returns whether this call terminated the command.
    ///
    /// The command is failed and finalized first; the kill signal is sent
    /// afterwards, outside the command lock.
    pub fn kill_if_executing(self: &Arc<Self>) -> bool {
        let label = self.command.label();
        let transcript = self
            .command
            .request()
            .stdout_from_transcript
            .then(|| self.transcript());

        let killed = self.command.update(|lc| {
            if lc.has_executed() {
                return false;
            }
            lc.result_data_mut().set_exit_code(KILLED_EXIT_CODE);
            if let Some(text) = &transcript {
                lc.result_data_mut().append_stdout(text);
            }
            lc.set_state_failed(Errno::PROCESS_KILLED.error(&[&label]))
        });

        if !killed {
            debug!(command = %label, "kill requested for a command that already executed; ignoring");
            return false;
        }

        info!(command = %label, "forcibly terminating session");
        self.finalize();

        match self.process.get() {
            Some(process) => process.kill(),
            None => debug!(command = %label, "no process attached yet; nothing to signal"),
        }
        true
    }

    /// Deliver the result. Only the first call for a command has an effect.
    pub fn finalize(self: &Arc<Self>) {
        if self.command.should_not_process_results() {
            debug!(command = %self.command.label(), "results already processed; ignoring");
            return;
        }

        match &self.client {
            Some(client) => client.on_session_finished(self),
            None => {
                self.conclude();
            }
        }
    }

    /// Move an executed command to `Success`, leaving failed ones alone.
    /// Returns the resulting state.
    pub fn conclude(&self) -> ExecutionState {
        self.command.update(|lc| {
            if lc.current_state() != ExecutionState::Failed {
                lc.set_state(ExecutionState::Success);
            }
            lc.current_state()
        })
    }
}
