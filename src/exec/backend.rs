// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The session runner talks to a `ProcessBackend` instead of spawning
//! processes itself. This makes it easy to swap in a fake backend in tests
//! while keeping the production implementation in [`task_runner`].
//!
//! - `TokioProcessBackend` is the default implementation. It spawns a
//!   `tokio::process::Command` and monitors it on a Tokio runtime.
//! - Tests can provide their own `ProcessBackend` whose processes never run
//!   and whose exit is driven by hand.
//!
//! [`task_runner`]: super::task_runner

use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, watch};
use tracing::debug;

use crate::engine::Session;
use crate::shell::Invocation;

use super::task_runner::monitor_process;

/// Handle on a spawned process, as seen by the session core.
pub trait ProcessControl: Send + Sync + fmt::Debug {
    fn pid(&self) -> Option<u32>;

    /// Whether the process has not been reaped yet.
    fn is_running(&self) -> bool;

    /// Exit code once the process is no longer running.
    fn exit_code(&self) -> Option<i32>;

    /// Request termination. Safe to call repeatedly and after exit.
    ///
    /// May return before the process is gone; see [`wait_for_exit`].
    fn kill(&self);

    /// Flips to `true` once the process has been reaped. `None` for
    /// processes nobody reaps.
    fn exit_watch(&self) -> Option<watch::Receiver<bool>> {
        None
    }
}

/// Wait up to `limit` for `process` to be reaped. Returns whether it was.
pub async fn wait_for_exit(process: &dyn ProcessControl, limit: Duration) -> bool {
    let Some(mut exited) = process.exit_watch() else {
        return !process.is_running();
    };
    match tokio::time::timeout(limit, exited.wait_for(|done| *done)).await {
        Ok(Ok(_)) => true,
        Ok(Err(_)) => !process.is_running(),
        Err(_) => false,
    }
}

/// A freshly spawned process.
///
/// `monitor` starts watching the process (output, exit). The runner calls it
/// only after `control` has been attached to the session, so the exit
/// callback always finds its process.
pub struct SpawnedProcess {
    pub control: Arc<dyn ProcessControl>,
    pub monitor: Box<dyn FnOnce() + Send>,
}

impl SpawnedProcess {
    /// A process that needs no monitoring, as used by fakes.
    pub fn unmonitored(control: Arc<dyn ProcessControl>) -> Self {
        Self {
            control,
            monitor: Box::new(|| {}),
        }
    }
}

impl fmt::Debug for SpawnedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedProcess")
            .field("control", &self.control)
            .finish_non_exhaustive()
    }
}

/// Trait abstracting how prepared invocations become processes.
///
/// Production code uses [`TokioProcessBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessBackend: Send + Sync {
    /// Spawn `invocation` for `session`.
    ///
    /// Once the process exits on its own, the backend must record its exit
    /// code in the control and then call [`Session::on_process_exit`].
    fn spawn(&self, session: &Arc<Session>, invocation: &Invocation) -> Result<SpawnedProcess>;
}

impl<B: ProcessBackend + ?Sized> ProcessBackend for Arc<B> {
    fn spawn(&self, session: &Arc<Session>, invocation: &Invocation) -> Result<SpawnedProcess> {
        (**self).spawn(session, invocation)
    }
}

/// [`ProcessControl`] for a child monitored by [`monitor_process`].
#[derive(Debug)]
pub struct ChildControl {
    pid: Option<u32>,
    running: AtomicBool,
    exit_code: Mutex<Option<i32>>,
    exited: watch::Sender<bool>,
    cancel_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl ChildControl {
    fn new(pid: Option<u32>, cancel_tx: oneshot::Sender<()>) -> Self {
        Self {
            pid,
            running: AtomicBool::new(true),
            exit_code: Mutex::new(None),
            exited: watch::Sender::new(false),
            cancel_tx: Mutex::new(Some(cancel_tx)),
        }
    }

    /// Record the exit code, then flip the running flag, so anyone who sees
    /// the process stopped also sees its code. Called once the child has
    /// been reaped.
    pub(crate) fn mark_exited(&self, code: i32) {
        *self.exit_code.lock() = Some(code);
        self.running.store(false, Ordering::SeqCst);
        self.exited.send_replace(true);
    }
}

impl ProcessControl for ChildControl {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn exit_code(&self) -> Option<i32> {
        *self.exit_code.lock()
    }

    fn kill(&self) {
        match self.cancel_tx.lock().take() {
            Some(tx) => {
                // The monitor may already be gone if the process just exited.
                let _ = tx.send(());
            }
            None => debug!(pid = ?self.pid, "kill already requested"),
        }
    }

    fn exit_watch(&self) -> Option<watch::Receiver<bool>> {
        Some(self.exited.subscribe())
    }
}

/// Real process backend used in production.
///
/// Holds a runtime handle so it can be driven from synchronous callers
/// (watchdogs, client callbacks) as well as from async code.
#[derive(Debug, Clone)]
pub struct TokioProcessBackend {
    handle: Handle,
}

impl TokioProcessBackend {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Backend bound to the runtime of the calling task.
    ///
    /// Panics when called outside a Tokio runtime, like [`Handle::current`].
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl ProcessBackend for TokioProcessBackend {
    fn spawn(&self, session: &Arc<Session>, invocation: &Invocation) -> Result<SpawnedProcess> {
        // Child reaping registers with the runtime's signal driver.
        let _guard = self.handle.enter();

        let mut cmd = Command::new(&invocation.executable);
        #[cfg(unix)]
        cmd.arg0(&invocation.process_name);
        cmd.args(invocation.args())
            .current_dir(&invocation.working_directory)
            .env_clear();
        for (key, value) in invocation.environment_pairs() {
            cmd.env(key, value);
        }

        let stdin = if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        cmd.stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().with_context(|| {
            format!(
                "spawning '{}' for '{}'",
                invocation.executable.display(),
                session.command().label()
            )
        })?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let control = Arc::new(ChildControl::new(child.id(), cancel_tx));

        let monitor = {
            let handle = self.handle.clone();
            let session = Arc::clone(session);
            let control = Arc::clone(&control);
            let stdin = invocation.stdin.clone();
            Box::new(move || {
                handle.spawn(monitor_process(child, stdin, session, control, cancel_rx));
            })
        };

        Ok(SpawnedProcess {
            control,
            monitor,
        })
    }
}
