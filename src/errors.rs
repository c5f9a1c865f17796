// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Command failures are not Rust errors: they are recorded as
//! [`crate::errno::Error`] entries on the command. This type covers the
//! plumbing around the engine (config, IO, result delivery).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TermexecError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Result delivery failed: {}", .0.log_string())]
    ResultDelivery(crate::errno::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TermexecError>;
