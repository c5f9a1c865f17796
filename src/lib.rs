// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod engine;
pub mod errno;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod result;
pub mod shell;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::command::report::{input_log_string, markdown_report};
use crate::command::{ExecutionCommand, ExecutionRequest, ResultConfig};
use crate::config::{ConfigFile, load_or_default};
use crate::engine::{
    ChannelClient, KILLED_EXIT_CODE, ResultSenderClient, Session, SessionEvent, SessionRunner,
};
use crate::errno::Errno;
use crate::exec::{TokioProcessBackend, wait_for_exit};
use crate::fs::{FileSystem, RealFileSystem};
use crate::shell::{DefaultShellEnvironment, ShellEnvironment, prepare};
use crate::types::{CommandId, Runner};

/// Exit status reported when the command could not be run at all.
pub const INTERNAL_FAILURE_EXIT_CODE: i32 = 1;

/// How long to wait for a killed child to be reaped before exiting anyway.
const REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// High-level entry point used by `main.rs`. Returns the exit status for the
/// `termexec` process.
///
/// This wires together:
/// - config loading
/// - shell environment and invocation preparation
/// - the session runner on the Tokio process backend
/// - timeout watchdog and Ctrl-C handling
/// - result delivery
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_or_default(args.config.as_deref())?;

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let environment: Arc<dyn ShellEnvironment> =
        Arc::new(DefaultShellEnvironment::new(cfg.shell_settings()));
    let command = Arc::new(ExecutionCommand::new(build_request(&args, &cfg)));

    if args.dry_run {
        return Ok(print_dry_run(&command, environment.as_ref(), fs.as_ref()));
    }

    let (events, mut rx) = ChannelClient::channel();
    let client = ResultSenderClient::new(Arc::clone(&fs)).then(Arc::new(events));
    let runner = SessionRunner::new(TokioProcessBackend::current(), environment, fs)
        .with_client(Arc::new(client));

    let session = runner.start(Arc::clone(&command));

    if let Some(secs) = args.timeout {
        spawn_timeout_watchdog(Arc::clone(&session), Duration::from_secs(secs));
    }

    // Ctrl-C → forced termination.
    {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received");
            session.kill_if_executing();
        });
    }

    loop {
        match rx.recv().await {
            Some(SessionEvent::Started(s)) => {
                debug!(command = %s.command().label(), pid = ?s.command().pid(), "session running");
            }
            Some(SessionEvent::Finished(_)) => break,
            None => bail!("session for '{}' ended without a result", command.label()),
        }
    }

    // A forced termination finishes the session before the child is gone;
    // `process::exit` in main would skip kill_on_drop.
    if let Some(process) = session.process() {
        if !wait_for_exit(process.as_ref(), REAP_TIMEOUT).await {
            warn!(
                command = %command.label(),
                pid = ?process.pid(),
                "process not reaped before exit"
            );
        }
    }

    Ok(report_outcome(&session))
}

/// Build the request for the command described on the command line, with
/// `[result]` settings from the config as defaults.
pub fn build_request(args: &CliArgs, cfg: &ConfigFile) -> ExecutionRequest {
    let mut result_config: ResultConfig = cfg.result_config();
    if let Some(dir) = &args.result_dir {
        result_config.result_directory = Some(dir.clone());
    }
    result_config.result_single_file |= args.result_single_file;
    if let Some(basename) = &args.result_basename {
        result_config.result_file_basename = Some(basename.clone());
    }
    if let Some(suffix) = &args.result_suffix {
        result_config.result_files_suffix = Some(suffix.clone());
    }

    // Only commands with a result directory report their result back.
    let is_plugin_execution_command = result_config.result_directory.is_some();

    ExecutionRequest {
        id: args.id.map(CommandId),
        command_label: args.label.clone(),
        executable: args.executable.clone(),
        arguments: args.args.clone(),
        stdin: args.stdin.clone(),
        working_directory: args.workdir.clone(),
        environment: args.env.iter().cloned().collect(),
        terminal_transcript_rows: args.transcript_rows,
        runner: if args.background {
            Runner::AppShell
        } else {
            Runner::TerminalSession
        },
        is_failsafe: args.failsafe,
        stdout_from_transcript: args.transcript,
        is_plugin_execution_command,
        result_config,
        ..ExecutionRequest::default()
    }
}

fn spawn_timeout_watchdog(session: Arc<Session>, timeout: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        if session.kill_if_executing() {
            warn!(
                command = %session.command().label(),
                timeout_secs = timeout.as_secs(),
                "command timed out"
            );
        }
    });
}

/// Print the command's output and work out the exit status.
///
/// - a normal exit reports the process exit code
/// - a forced termination reports 137
/// - any other failure prints the markdown report to stderr and reports 1
fn report_outcome(session: &Session) -> i32 {
    let command = session.command();
    let data = command.result_data();

    print!("{}", data.stdout());
    eprint!("{}", data.stderr());

    if !command.is_state_failed() {
        return data.exit_code().unwrap_or(INTERNAL_FAILURE_EXIT_CODE);
    }

    if data.err_code() == Errno::PROCESS_KILLED.code {
        return data.exit_code().unwrap_or(KILLED_EXIT_CODE);
    }

    eprintln!("{}", markdown_report(command));
    INTERNAL_FAILURE_EXIT_CODE
}

/// Resolve the invocation and print it without running anything.
fn print_dry_run(
    command: &ExecutionCommand,
    environment: &dyn ShellEnvironment,
    fs: &dyn FileSystem,
) -> i32 {
    println!("termexec dry-run");
    println!("{}", input_log_string(command, true));
    println!();

    match prepare(command, environment, fs) {
        Ok(invocation) => {
            println!("executable: {}", invocation.executable.display());
            println!("argv: {:?}", invocation.arguments);
            println!("working directory: {}", invocation.working_directory.display());
            println!("login shell: {}", invocation.is_login_shell);
            println!("environment ({}):", invocation.environment.len());
            for entry in &invocation.environment {
                println!("  {entry}");
            }
            debug!("dry-run complete (no execution)");
            0
        }
        Err(error) => {
            eprintln!("{}", error.log_string());
            INTERNAL_FAILURE_EXIT_CODE
        }
    }
}
