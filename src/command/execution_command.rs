// src/command/execution_command.rs

//! The execution command: an immutable request plus a guarded lifecycle.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use parking_lot::Mutex;
use tracing::{error, warn};
use url::Url;

use crate::command::result_config::ResultConfig;
use crate::command::result_data::ResultData;
use crate::command::state::ExecutionState;
use crate::errno::{Errno, Error};
use crate::types::{CommandId, Runner};

const DEFAULT_LABEL: &str = "Execution Command";

/// Everything the caller asks for. Built before the command exists and
/// never modified afterwards.
#[derive(Debug, Clone, Default)]
pub struct ExecutionRequest {
    pub id: Option<CommandId>,
    pub command_label: Option<String>,

    pub executable: Option<String>,
    /// Alternative to `executable`; only `file://` URIs are accepted.
    pub executable_uri: Option<Url>,
    pub arguments: Vec<String>,
    pub stdin: Option<String>,
    pub working_directory: Option<PathBuf>,
    /// Caller overrides merged on top of the shell environment.
    pub environment: BTreeMap<String, String>,
    /// Number of transcript lines to keep; `None` keeps everything.
    pub terminal_transcript_rows: Option<usize>,
    pub runner: Runner,
    /// Skip login-shell resolution and go straight to the fallback shell.
    pub is_failsafe: bool,
    /// Fill stdout from the interleaved transcript instead of the raw streams.
    pub stdout_from_transcript: bool,

    pub is_plugin_execution_command: bool,
    pub result_config: ResultConfig,

    pub command_description: Option<String>,
    pub command_help: Option<String>,
    pub plugin_api_help: Option<String>,
}

/// Mutable part of a command. Only reachable through
/// [`ExecutionCommand::update`] while the command lock is held.
#[derive(Debug)]
pub struct Lifecycle {
    current: ExecutionState,
    previous: ExecutionState,
    results_processed: bool,
    pid: Option<u32>,
    label: String,
    result_data: ResultData,
}

impl Lifecycle {
    fn new(label: String) -> Self {
        Self {
            current: ExecutionState::PreExecution,
            previous: ExecutionState::PreExecution,
            results_processed: false,
            pid: None,
            label,
            result_data: ResultData::new(),
        }
    }

    pub fn current_state(&self) -> ExecutionState {
        self.current
    }

    pub fn previous_state(&self) -> ExecutionState {
        self.previous
    }

    /// Move to `new`. Rejected when going backwards or leaving `Success`.
    ///
    /// `previous` is not overwritten while in `Failed`, so it keeps the last
    /// state the command was in before it first failed.
    pub fn set_state(&mut self, new: ExecutionState) -> bool {
        if !self.current.can_transition_to(new) {
            error!(
                command = %self.label,
                from = %self.current,
                to = %new,
                "invalid execution state transition"
            );
            return false;
        }

        if self.current != ExecutionState::Failed {
            self.previous = self.current;
        }
        self.current = new;
        true
    }

    /// Record `error` and move to `Failed`.
    pub fn set_state_failed(&mut self, error: Error) -> bool {
        if !self.result_data.set_state_failed(error) {
            warn!(
                command = %self.label,
                "set_state_failed called with a non-failure error record"
            );
        }
        self.set_state(ExecutionState::Failed)
    }

    pub fn has_executed(&self) -> bool {
        self.current >= ExecutionState::Executed
    }

    pub fn is_executing(&self) -> bool {
        self.current == ExecutionState::Executing
    }

    pub fn is_successful(&self) -> bool {
        self.current == ExecutionState::Success
    }

    /// `Failed` state backed by at least one failed error record.
    pub fn is_state_failed(&self) -> bool {
        if self.current != ExecutionState::Failed {
            return false;
        }

        if !self.result_data.is_state_failed() {
            warn!(
                command = %self.label,
                errors = ?self.result_data.errors().as_slice(),
                "command is in Failed state but has no failed error recorded"
            );
            return false;
        }
        true
    }

    /// At-most-once gate: `false` on the first call, `true` afterwards.
    pub fn should_not_process_results(&mut self) -> bool {
        if self.results_processed {
            true
        } else {
            self.results_processed = true;
            false
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn set_pid(&mut self, pid: Option<u32>) {
        self.pid = pid;
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn result_data(&self) -> &ResultData {
        &self.result_data
    }

    /// Output buffers and exit code. Errors can only be added through
    /// [`Lifecycle::set_state_failed`].
    pub fn result_data_mut(&mut self) -> &mut ResultData {
        &mut self.result_data
    }
}

/// One requested execution, its state machine and its result.
///
/// Shared between threads as `Arc<ExecutionCommand>`; every mutating
/// operation takes the command lock exactly once.
pub struct ExecutionCommand {
    request: ExecutionRequest,
    lifecycle: Mutex<Lifecycle>,
}

impl fmt::Debug for ExecutionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lc = self.lifecycle.lock();
        f.debug_struct("ExecutionCommand")
            .field("request", &self.request)
            .field("current", &lc.current)
            .field("previous", &lc.previous)
            .field("result_data", &lc.result_data)
            .finish_non_exhaustive()
    }
}

impl ExecutionCommand {
    pub fn new(request: ExecutionRequest) -> Self {
        let label = log_label(request.id, request.command_label.as_deref());
        Self {
            request,
            lifecycle: Mutex::new(Lifecycle::new(label)),
        }
    }

    pub fn request(&self) -> &ExecutionRequest {
        &self.request
    }

    pub fn id(&self) -> Option<CommandId> {
        self.request.id
    }

    /// `"(id) label"` as used in log lines and reports.
    pub fn label(&self) -> String {
        self.lifecycle.lock().label.clone()
    }

    /// Run `f` with the lifecycle locked. This is the single entry point for
    /// every lifecycle mutation; compound check-then-act sequences belong in
    /// one `update` call.
    pub fn update<R>(&self, f: impl FnOnce(&mut Lifecycle) -> R) -> R {
        let mut lc = self.lifecycle.lock();
        f(&mut lc)
    }

    pub fn set_state(&self, new: ExecutionState) -> bool {
        self.update(|lc| lc.set_state(new))
    }

    pub fn set_state_failed(&self, error: Error) -> bool {
        self.update(|lc| lc.set_state_failed(error))
    }

    pub fn set_state_failed_with(&self, code: i32, message: impl Into<String>) -> bool {
        self.set_state_failed(Error::new(None, code, message))
    }

    pub fn set_state_failed_with_causes(
        &self,
        code: i32,
        message: impl Into<String>,
        causes: impl IntoIterator<Item = anyhow::Error>,
    ) -> bool {
        self.set_state_failed(Error::new(None, code, message).with_causes(causes))
    }

    pub fn set_state_failed_errno(&self, errno: Errno, args: &[&dyn fmt::Display]) -> bool {
        self.set_state_failed(errno.error(args))
    }

    pub fn current_state(&self) -> ExecutionState {
        self.update(|lc| lc.current_state())
    }

    pub fn previous_state(&self) -> ExecutionState {
        self.update(|lc| lc.previous_state())
    }

    pub fn has_executed(&self) -> bool {
        self.update(|lc| lc.has_executed())
    }

    pub fn is_executing(&self) -> bool {
        self.update(|lc| lc.is_executing())
    }

    pub fn is_successful(&self) -> bool {
        self.update(|lc| lc.is_successful())
    }

    pub fn is_state_failed(&self) -> bool {
        self.update(|lc| lc.is_state_failed())
    }

    pub fn should_not_process_results(&self) -> bool {
        self.update(|lc| lc.should_not_process_results())
    }

    pub fn pid(&self) -> Option<u32> {
        self.update(|lc| lc.pid())
    }

    /// Snapshot of the result data.
    pub fn result_data(&self) -> ResultData {
        self.update(|lc| lc.result_data().clone())
    }

    pub fn is_plugin_execution_command_with_pending_result(&self) -> bool {
        self.request.is_plugin_execution_command
            && self.request.result_config.is_command_with_pending_result()
    }

    /// Replace the generic label with `process_name` when the caller gave
    /// none.
    pub(crate) fn set_default_label(&self, process_name: &str) {
        if self.request.command_label.is_some() {
            return;
        }
        let label = log_label(self.request.id, Some(process_name));
        self.update(|lc| lc.label = label);
    }
}

fn log_label(id: Option<CommandId>, label: Option<&str>) -> String {
    let label = match label {
        Some(l) if !l.is_empty() => l,
        _ => DEFAULT_LABEL,
    };
    match id {
        Some(id) => format!("({id}) {label}"),
        None => label.to_string(),
    }
}
