// tests/runner_process.rs

mod common;

use std::time::Duration;

use common::{host_runner, next_finished};
use termexec::command::ExecutionState;
use termexec::engine::{KILLED_EXIT_CODE, SessionEvent};
use termexec::errno::Errno;
use termexec::exec::wait_for_exit;
use termexec_test_utils::builders::RequestBuilder;
use termexec_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn echo_hi_is_collected_and_concluded() -> TestResult {
    init_tracing();
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/bin/echo", &["hi"]).command();

    runner.start(cmd.clone());
    let session = next_finished(&mut rx).await;

    assert_eq!(cmd.current_state(), ExecutionState::Executed);
    assert_eq!(session.conclude(), ExecutionState::Success);

    let data = cmd.result_data();
    assert_eq!(data.stdout(), "hi\n");
    assert_eq!(data.stderr(), "");
    assert_eq!(data.exit_code(), Some(0));
    assert!(cmd.pid().is_some());
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_is_not_a_failure() -> TestResult {
    init_tracing();
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/bin/sh", &["-c", "echo oops >&2; exit 3"]).command();

    runner.start(cmd.clone());
    let session = next_finished(&mut rx).await;

    assert_eq!(session.conclude(), ExecutionState::Success);
    let data = cmd.result_data();
    assert_eq!(data.exit_code(), Some(3));
    assert_eq!(data.stderr(), "oops\n");
    assert_eq!(data.err_code(), 0);
    Ok(())
}

#[tokio::test]
async fn killing_a_running_process_reports_137() -> TestResult {
    init_tracing();
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/bin/sleep", &["30"]).command();

    let session = runner.start(cmd.clone());
    match with_timeout(rx.recv()).await {
        Some(SessionEvent::Started(_)) => {}
        other => panic!("expected Started, got {other:?}"),
    }

    assert!(session.kill_if_executing());
    next_finished(&mut rx).await;

    assert!(cmd.is_state_failed());
    let data = cmd.result_data();
    assert_eq!(data.exit_code(), Some(KILLED_EXIT_CODE));
    assert_eq!(data.err_code(), Errno::PROCESS_KILLED.code);

    let process = session.process().expect("process attached").clone();
    assert!(wait_for_exit(process.as_ref(), Duration::from_secs(5)).await);
    assert_eq!(process.exit_code(), Some(KILLED_EXIT_CODE));

    // The late exit report changed nothing.
    assert_eq!(cmd.result_data().errors().len(), 1);
    assert!(rx.try_recv().is_err());
    Ok(())
}

#[tokio::test]
async fn killed_child_is_reaped_once_waited_for() -> TestResult {
    init_tracing();
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/bin/sleep", &["30"]).command();

    let session = runner.start(cmd.clone());
    let process = session.process().expect("process attached").clone();
    let pid = process.pid().expect("child pid");

    assert!(session.kill_if_executing());
    // The result is final before the signal is even sent.
    next_finished(&mut rx).await;

    assert!(wait_for_exit(process.as_ref(), Duration::from_secs(5)).await);
    assert!(!process.is_running());

    let alive = std::process::Command::new("/bin/sh")
        .args(["-c", &format!("kill -0 {pid} 2>/dev/null")])
        .status()?;
    assert!(!alive.success(), "pid {pid} still exists after reaping");
    Ok(())
}

#[tokio::test]
async fn stdin_is_fed_to_the_process() -> TestResult {
    init_tracing();
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/bin/cat", &[])
        .stdin("line1\nline2\n")
        .command();

    runner.start(cmd.clone());
    next_finished(&mut rx).await;

    assert_eq!(cmd.result_data().stdout(), "line1\nline2\n");
    Ok(())
}

#[tokio::test]
async fn caller_environment_reaches_the_process() -> TestResult {
    init_tracing();
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/bin/sh", &["-c", "echo \"$FOO:$HOME\""])
        .env("FOO", "bar")
        .command();

    runner.start(cmd.clone());
    next_finished(&mut rx).await;

    assert_eq!(cmd.result_data().stdout(), "bar:/tmp\n");
    Ok(())
}

#[tokio::test]
async fn process_runs_in_the_requested_directory() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let expected = dir.path().canonicalize()?;
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/bin/sh", &["-c", "pwd -P"])
        .working_directory(dir.path().to_str().expect("utf-8 temp path"))
        .command();

    runner.start(cmd.clone());
    next_finished(&mut rx).await;

    assert_eq!(
        cmd.result_data().stdout(),
        format!("{}\n", expected.display())
    );
    Ok(())
}

#[tokio::test]
async fn missing_program_fails_to_spawn() -> TestResult {
    init_tracing();
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/nonexistent/program", &[]).command();

    let session = runner.start(cmd.clone());
    next_finished(&mut rx).await;

    assert!(session.process().is_none());
    assert!(cmd.is_state_failed());
    assert_eq!(cmd.result_data().err_code(), Errno::SPAWN_FAILED.code);
    Ok(())
}

#[tokio::test]
async fn transcript_mode_interleaves_both_streams_into_stdout() -> TestResult {
    init_tracing();
    let (runner, mut rx) = host_runner();
    let cmd = RequestBuilder::exec("/bin/sh", &["-c", "echo a; echo b >&2"])
        .stdout_from_transcript(true)
        .command();

    let session = runner.start(cmd.clone());
    next_finished(&mut rx).await;

    let data = cmd.result_data();
    let mut lines: Vec<&str> = data.stdout().lines().collect();
    lines.sort();
    assert_eq!(lines, vec!["a", "b"]);
    assert_eq!(data.stderr(), "");
    assert_eq!(session.transcript(), data.stdout());
    Ok(())
}
