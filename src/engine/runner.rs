// src/engine/runner.rs

//! Starting sessions: prepare, transition, spawn.

use std::sync::Arc;

use tracing::{debug, info};

use crate::command::{ExecutionCommand, ExecutionState};
use crate::engine::Session;
use crate::engine::client::SessionClient;
use crate::errno::Errno;
use crate::exec::{ProcessBackend, SpawnedProcess};
use crate::fs::FileSystem;
use crate::shell::{Invocation, ShellEnvironment, prepare};

/// Turns execution commands into running sessions.
pub struct SessionRunner<B: ProcessBackend> {
    backend: B,
    environment: Arc<dyn ShellEnvironment>,
    fs: Arc<dyn FileSystem>,
    client: Option<Arc<dyn SessionClient>>,
}

impl<B: ProcessBackend> SessionRunner<B> {
    pub fn new(backend: B, environment: Arc<dyn ShellEnvironment>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            backend,
            environment,
            fs,
            client: None,
        }
    }

    /// Attach the client every started session reports to.
    pub fn with_client(mut self, client: Arc<dyn SessionClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start a session for `command`.
    ///
    /// Always returns the session. Failures while preparing or spawning are
    /// recorded on the command and finalized before this returns; no
    /// process is spawned in that case.
    pub fn start(&self, command: Arc<ExecutionCommand>) -> Arc<Session> {
        let session = Arc::new(Session::new(Arc::clone(&command), self.client.clone()));

        let invocation = match prepare(&command, self.environment.as_ref(), self.fs.as_ref()) {
            Ok(invocation) => invocation,
            Err(error) => {
                session.fail(error);
                return session;
            }
        };
        session.set_invocation(invocation.clone());

        let transition = command.update(|lc| {
            let from = lc.current_state();
            if lc.set_state(ExecutionState::Executing) {
                Ok(())
            } else {
                Err(from)
            }
        });
        if let Err(from) = transition {
            session.fail(Errno::INVALID_STATE_TRANSITION.error(&[
                &command.label(),
                &from,
                &ExecutionState::Executing,
            ]));
            return session;
        }

        let spawned = match self.spawn_if_executing(&session, &invocation) {
            None => {
                debug!(command = %command.label(), "command failed before spawn; not spawning");
                session.finalize();
                return session;
            }
            Some(Ok(spawned)) => spawned,
            Some(Err(e)) => {
                let error = Errno::SPAWN_FAILED.error_with_cause(
                    &[&invocation.executable.display(), &command.label()],
                    e,
                );
                session.fail(error);
                return session;
            }
        };

        session.attach_process(Arc::clone(&spawned.control));
        info!(
            command = %command.label(),
            pid = ?spawned.control.pid(),
            "session started"
        );
        if let Some(client) = &self.client {
            client.on_session_started(&session);
        }
        (spawned.monitor)();

        // A kill that landed between the transition and the attach found no
        // process to signal.
        if command.is_state_failed() {
            debug!(command = %command.label(), "command failed while spawning; killing process");
            spawned.control.kill();
        }

        session
    }

    /// Spawn only while the command is still executing.
    fn spawn_if_executing(
        &self,
        session: &Arc<Session>,
        invocation: &Invocation,
    ) -> Option<anyhow::Result<SpawnedProcess>> {
        if !session.command().is_executing() {
            return None;
        }
        Some(self.backend.spawn(session, invocation))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::command::ExecutionRequest;
    use crate::fs::mock::MockFileSystem;
    use crate::shell::DefaultShellEnvironment;

    #[derive(Default)]
    struct CountingBackend {
        spawns: AtomicUsize,
    }

    impl ProcessBackend for CountingBackend {
        fn spawn(&self, _: &Arc<Session>, _: &Invocation) -> anyhow::Result<SpawnedProcess> {
            self.spawns.fetch_add(1, Ordering::SeqCst);
            Err(anyhow::anyhow!("not a real backend"))
        }
    }

    fn invocation() -> Invocation {
        Invocation {
            executable: "/bin/true".into(),
            arguments: vec!["true".to_string()],
            working_directory: "/".into(),
            environment: Vec::new(),
            is_login_shell: false,
            process_name: "true".to_string(),
            stdin: None,
        }
    }

    fn runner() -> SessionRunner<CountingBackend> {
        SessionRunner::new(
            CountingBackend::default(),
            Arc::new(DefaultShellEnvironment::default()),
            Arc::new(MockFileSystem::new()),
        )
    }

    #[test]
    fn failure_after_the_transition_skips_the_spawn() {
        let runner = runner();
        let command = Arc::new(ExecutionCommand::new(ExecutionRequest::default()));
        let session = Arc::new(Session::new(Arc::clone(&command), None));

        assert!(command.set_state(ExecutionState::Executing));
        command.set_state_failed(Errno::PROCESS_KILLED.error(&[&"test"]));

        assert!(runner.spawn_if_executing(&session, &invocation()).is_none());
        assert_eq!(runner.backend().spawns.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn executing_commands_reach_the_backend() {
        let runner = runner();
        let command = Arc::new(ExecutionCommand::new(ExecutionRequest::default()));
        let session = Arc::new(Session::new(Arc::clone(&command), None));

        assert!(command.set_state(ExecutionState::Executing));

        assert!(matches!(
            runner.spawn_if_executing(&session, &invocation()),
            Some(Err(_))
        ));
        assert_eq!(runner.backend().spawns.load(Ordering::SeqCst), 1);
    }
}
