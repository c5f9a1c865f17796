// src/shell/mod.rs

//! Shell environment and invocation preparation.
//!
//! - [`environment`] defines the pluggable `ShellEnvironment` and its
//!   settings-driven default.
//! - [`prepare`] resolves executable, argv, working directory and the final
//!   environment for a command.
//! - [`interpreter`] sniffs executables for shebangs.

pub mod environment;
pub mod interpreter;
pub mod prepare;

pub use environment::{DefaultShellEnvironment, ShellEnvironment, ShellSettings};
pub use prepare::{build_environment, prepare, Invocation};
