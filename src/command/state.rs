// src/command/state.rs

//! Execution state of a command and its ordering rules.

use std::cmp::Ordering;
use std::fmt;

/// Lifecycle state of an [`ExecutionCommand`](crate::command::ExecutionCommand).
///
/// `Success` and `Failed` describe the command from the engine's point of
/// view: a process that exits non-zero still ends in `Success` unless an
/// internal error was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    PreExecution,
    Executing,
    Executed,
    Success,
    Failed,
}

impl ExecutionState {
    /// Position of the state in the transition order.
    ///
    /// `Failed` ranks above every other state so that it is reachable from
    /// anywhere and nothing can be entered after it except `Failed` again.
    pub const fn rank(self) -> u8 {
        match self {
            ExecutionState::PreExecution => 0,
            ExecutionState::Executing => 1,
            ExecutionState::Executed => 2,
            ExecutionState::Success => 3,
            ExecutionState::Failed => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ExecutionState::PreExecution => "Pre-Execution",
            ExecutionState::Executing => "Executing",
            ExecutionState::Executed => "Executed",
            ExecutionState::Success => "Success",
            ExecutionState::Failed => "Failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ExecutionState::Success | ExecutionState::Failed)
    }

    /// Whether a transition from `self` to `next` is permitted.
    ///
    /// Order must not go backwards, and nothing leaves `Success`.
    pub fn can_transition_to(self, next: ExecutionState) -> bool {
        self != ExecutionState::Success && next >= self
    }
}

impl Default for ExecutionState {
    fn default() -> Self {
        ExecutionState::PreExecution
    }
}

impl Ord for ExecutionState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for ExecutionState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
