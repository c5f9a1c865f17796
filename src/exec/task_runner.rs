// src/exec/task_runner.rs

//! Monitoring of a single spawned process.

use std::process::ExitStatus;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::engine::{OutputStream, Session};

use super::backend::ChildControl;

/// How long output readers may keep running after the process was reaped.
/// Grandchildren can hold the pipes open indefinitely.
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Feed stdin, pump output into the session, wait for the process and report
/// its exit.
///
/// - If the process exits on its own, its exit code is recorded in `control`
///   and [`Session::on_process_exit`] runs once all output has been drained.
/// - If the cancel channel fires, the child is killed first. The exit is
///   still reported; the session ignores it because the kill path already
///   failed the command.
pub(crate) async fn monitor_process(
    mut child: Child,
    stdin: Option<String>,
    session: Arc<Session>,
    control: Arc<ChildControl>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let label = session.command().label();
    let pid = child.id();

    if let (Some(payload), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let label = label.clone();
        tokio::spawn(async move {
            if let Err(e) = pipe.write_all(payload.as_bytes()).await {
                debug!(command = %label, error = %e, "failed to write stdin");
            }
            // Dropping the pipe closes the child's stdin.
        });
    }

    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, Arc::clone(&session), OutputStream::Stdout));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, Arc::clone(&session), OutputStream::Stderr));
    }

    // Either the process exits on its own (normal case), or the session asks
    // for it to be killed (timeout, user cancel).
    let status = tokio::select! {
        status = child.wait() => status,
        cancel = &mut cancel_rx => {
            match cancel {
                Ok(()) => {
                    info!(command = %label, ?pid, "kill requested; killing process");
                    if let Err(e) = child.kill().await {
                        warn!(command = %label, ?pid, error = %e, "failed to kill child process");
                    }
                }
                Err(e) => {
                    debug!(
                        command = %label,
                        error = %e,
                        "cancel channel closed without explicit kill"
                    );
                }
            }
            child.wait().await
        }
    };

    let exit_code = match status {
        Ok(status) => exit_code_of(status),
        Err(e) => {
            error!(command = %label, ?pid, error = %e, "waiting for process failed");
            -1
        }
    };

    for reader in readers {
        drain(reader, &label).await;
    }

    control.mark_exited(exit_code);
    session.on_process_exit();
}

fn spawn_reader<R>(reader: R, session: Arc<Session>, stream: OutputStream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    trace!(command = %session.command().label(), ?stream, "{}", line);
                    session.record_output(stream, &line);
                }
                Ok(None) => break,
                Err(e) => {
                    debug!(
                        command = %session.command().label(),
                        ?stream,
                        error = %e,
                        "stopped reading output"
                    );
                    break;
                }
            }
        }
    })
}

async fn drain(mut reader: JoinHandle<()>, label: &str) {
    match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut reader).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(command = %label, error = %e, "output reader panicked"),
        Err(_) => {
            warn!(command = %label, "output still open after exit; dropping the rest");
            reader.abort();
        }
    }
}

/// Exit code of `status`, using the shell convention `128 + signal` for
/// processes terminated by a signal.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
