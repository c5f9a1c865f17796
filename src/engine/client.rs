// src/engine/client.rs

//! Session clients: who gets told when a session starts and finishes.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::{Session, SessionEvent};
use crate::errno::{Errno, Error};
use crate::errors::TermexecError;
use crate::fs::FileSystem;
use crate::result::send_result;

/// Receiver of session lifecycle callbacks.
///
/// `on_session_finished` is called at most once per command, when its result
/// is ready. The client owns the final `Success`/`Failed` decision; most
/// clients start with [`Session::conclude`].
pub trait SessionClient: Send + Sync {
    fn on_session_started(&self, _session: &Arc<Session>) {}

    fn on_session_finished(&self, session: &Arc<Session>);
}

impl<F> SessionClient for F
where
    F: Fn(&Arc<Session>) + Send + Sync,
{
    fn on_session_finished(&self, session: &Arc<Session>) {
        self(session)
    }
}

/// Forwards lifecycle callbacks as [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct ChannelClient {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelClient {
    pub fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Client plus the receiving end of its events.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("session event receiver dropped");
        }
    }
}

impl SessionClient for ChannelClient {
    fn on_session_started(&self, session: &Arc<Session>) {
        self.send(SessionEvent::Started(Arc::clone(session)));
    }

    fn on_session_finished(&self, session: &Arc<Session>) {
        self.send(SessionEvent::Finished(Arc::clone(session)));
    }
}

/// Delivers a plugin command's result through the configured result files,
/// concludes the command, then hands over to an optional inner client.
///
/// A delivery failure is recorded on the command, so it ends `Failed`.
pub struct ResultSenderClient {
    fs: Arc<dyn FileSystem>,
    next: Option<Arc<dyn SessionClient>>,
}

impl ResultSenderClient {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs, next: None }
    }

    pub fn then(mut self, next: Arc<dyn SessionClient>) -> Self {
        self.next = Some(next);
        self
    }
}

impl SessionClient for ResultSenderClient {
    fn on_session_started(&self, session: &Arc<Session>) {
        if let Some(next) = &self.next {
            next.on_session_started(session);
        }
    }

    fn on_session_finished(&self, session: &Arc<Session>) {
        let command = session.command();
        let config = &command.request().result_config;
        let label = command.label();

        match config.result_directory.as_deref() {
            Some(dir) if command.is_plugin_execution_command_with_pending_result() => {
                let data = command.result_data();
                match send_result(self.fs.as_ref(), &label, config, &data) {
                    Ok(()) => info!(command = %label, "result delivered"),
                    Err(e) => {
                        error!(command = %label, error = %e, "failed to deliver result");
                        command.set_state_failed(delivery_error(e, dir));
                    }
                }
            }
            Some(_) => debug!(command = %label, "not a plugin command; result files skipped"),
            None => {}
        }

        let state = session.conclude();
        debug!(command = %label, %state, "session concluded");

        if let Some(next) = &self.next {
            next.on_session_finished(session);
        }
    }
}

fn delivery_error(error: TermexecError, dir: &Path) -> Error {
    match error {
        TermexecError::ResultDelivery(error) => error,
        other => Errno::RESULT_WRITE_FAILED.error_with_cause(&[&dir.display()], other),
    }
}
