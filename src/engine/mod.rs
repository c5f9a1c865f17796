// src/engine/mod.rs

//! Session engine for termexec.
//!
//! This module ties together:
//! - the execution command lifecycle (see [`crate::command`])
//! - invocation preparation (see [`crate::shell`])
//! - the process backend (see [`crate::exec`])
//! - the clients that receive finished results
//!
//! The pure session core lives in [`session`]; [`runner`] drives a command
//! from preparation to a spawned process, and [`client`] holds the stock
//! result consumers.

use std::sync::Arc;

pub mod client;
pub mod runner;
pub mod session;

pub use client::{ChannelClient, ResultSenderClient, SessionClient};
pub use runner::SessionRunner;
pub use session::{KILLED_EXIT_CODE, OutputStream, Session};

/// Lifecycle notifications emitted by [`ChannelClient`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The process was spawned and is being monitored.
    Started(Arc<Session>),
    /// The command's result is ready; delivered at most once per command.
    Finished(Arc<Session>),
}

impl SessionEvent {
    pub fn session(&self) -> &Arc<Session> {
        match self {
            SessionEvent::Started(session) | SessionEvent::Finished(session) => session,
        }
    }
}
