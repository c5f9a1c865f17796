use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use anyhow::anyhow;
use parking_lot::Mutex;

use termexec::engine::{Session, SessionClient};
use termexec::exec::{ProcessBackend, ProcessControl, SpawnedProcess};
use termexec::shell::Invocation;

/// A process that never runs. Tests decide when it exits.
#[derive(Debug)]
pub struct FakeProcess {
    pid: u32,
    running: AtomicBool,
    exit_code: Mutex<Option<i32>>,
    kills: AtomicUsize,
}

impl FakeProcess {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            running: AtomicBool::new(true),
            exit_code: Mutex::new(None),
            kills: AtomicUsize::new(0),
        }
    }

    /// Mark the process as exited with `code`.
    pub fn exit(&self, code: i32) {
        *self.exit_code.lock() = Some(code);
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

impl ProcessControl for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn exit_code(&self) -> Option<i32> {
        *self.exit_code.lock()
    }

    fn kill(&self) {
        self.kills.fetch_add(1, Ordering::SeqCst);
    }
}

/// A fake backend that:
/// - records every invocation it was asked to spawn
/// - hands out `FakeProcess`es instead of real processes
/// - optionally fails every spawn.
#[derive(Debug, Default)]
pub struct FakeBackend {
    fail_with: Option<String>,
    next_pid: AtomicU32,
    spawned: Mutex<Vec<(Invocation, Arc<FakeProcess>)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            fail_with: None,
            next_pid: AtomicU32::new(1000),
            spawned: Mutex::new(Vec::new()),
        }
    }

    /// A backend whose spawns all fail with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.lock().len()
    }

    pub fn last_process(&self) -> Option<Arc<FakeProcess>> {
        self.spawned.lock().last().map(|(_, p)| Arc::clone(p))
    }

    pub fn last_invocation(&self) -> Option<Invocation> {
        self.spawned.lock().last().map(|(i, _)| i.clone())
    }
}

impl ProcessBackend for FakeBackend {
    fn spawn(&self, _session: &Arc<Session>, invocation: &Invocation) -> anyhow::Result<SpawnedProcess> {
        if let Some(message) = &self.fail_with {
            return Err(anyhow!("{}", message));
        }

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        let process = Arc::new(FakeProcess::new(pid));
        self.spawned
            .lock()
            .push((invocation.clone(), Arc::clone(&process)));

        Ok(SpawnedProcess::unmonitored(process))
    }
}

/// A client that records finished sessions and, by default, concludes them.
#[derive(Debug, Default)]
pub struct RecordingClient {
    leave_unconcluded: bool,
    started: AtomicUsize,
    finished: Mutex<Vec<Arc<Session>>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that only records, leaving the command in `Executed`.
    pub fn passive() -> Self {
        Self {
            leave_unconcluded: true,
            ..Self::default()
        }
    }

    pub fn started_count(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished_count(&self) -> usize {
        self.finished.lock().len()
    }

    pub fn finished(&self) -> Vec<Arc<Session>> {
        self.finished.lock().clone()
    }
}

impl SessionClient for RecordingClient {
    fn on_session_started(&self, _session: &Arc<Session>) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_session_finished(&self, session: &Arc<Session>) {
        self.finished.lock().push(Arc::clone(session));
        if !self.leave_unconcluded {
            session.conclude();
        }
    }
}
