// src/command/mod.rs

//! Execution command model.
//!
//! - [`state`] defines `ExecutionState` and its ordering rules.
//! - [`result_data`] aggregates stdout/stderr/exit code and the append-only
//!   error log.
//! - [`result_config`] describes where results should be delivered.
//! - [`execution_command`] ties a request to its guarded lifecycle.
//! - [`report`] renders commands for logs and failure reports.

pub mod execution_command;
pub mod report;
pub mod result_config;
pub mod result_data;
pub mod state;

pub use execution_command::{ExecutionCommand, ExecutionRequest, Lifecycle};
pub use result_config::ResultConfig;
pub use result_data::{ErrorLog, ResultData};
pub use state::ExecutionState;
