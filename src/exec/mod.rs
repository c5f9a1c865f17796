// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running prepared invocations,
//! using `tokio::process::Command`, and reporting back to the session core.
//!
//! - [`backend`] provides the `ProcessBackend` and `ProcessControl` traits
//!   and the production `TokioProcessBackend`, which tests can replace with
//!   a fake implementation.
//! - [`task_runner`] monitors one spawned process: stdin, output pumps,
//!   exit and kill handling.

pub mod backend;
pub mod task_runner;

pub use backend::{
    ChildControl, ProcessBackend, ProcessControl, SpawnedProcess, TokioProcessBackend, wait_for_exit,
};
pub use task_runner::exit_code_of;
