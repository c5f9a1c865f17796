// src/command/report.rs

//! Human-readable renderings of a command, for logs and failure reports.

use std::fmt::Write as _;

use crate::command::execution_command::ExecutionCommand;
use crate::command::result_config::ResultConfig;
use crate::command::result_data::ResultData;
use crate::command::state::ExecutionState;

/// Multi-line description of what was requested.
pub fn input_log_string(command: &ExecutionCommand, log_stdin: bool) -> String {
    let req = command.request();
    let (current, previous, pid) =
        command.update(|lc| (lc.current_state(), lc.previous_state(), lc.pid()));

    let mut out = format!("{}:", command.label());
    if let Some(pid) = pid {
        let _ = write!(out, "\nPid: `{pid}`");
    }
    if previous != ExecutionState::PreExecution {
        let _ = write!(out, "\nPrevious State: `{previous}`");
    }
    let _ = write!(out, "\nCurrent State: `{current}`");
    let _ = write!(out, "\nExecutable: `{}`", opt(req.executable.as_deref()));
    if let Some(uri) = &req.executable_uri {
        let _ = write!(out, "\nExecutable Uri: `{uri}`");
    }
    out.push('\n');
    out.push_str(&arguments_log_string("Arguments", &req.arguments));
    let _ = write!(
        out,
        "\nWorking Directory: `{}`",
        req.working_directory
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    let _ = write!(out, "\nRunner: `{}`", req.runner);
    let _ = write!(out, "\nisFailsafe: `{}`", req.is_failsafe);
    if log_stdin {
        if let Some(stdin) = req.stdin.as_deref().filter(|s| !s.is_empty()) {
            let _ = write!(out, "\nStdin:\n```\n{stdin}\n```");
        }
    }
    if !req.environment.is_empty() {
        let keys: Vec<&str> = req.environment.keys().map(String::as_str).collect();
        let _ = write!(out, "\nEnvironment Overrides: `{}`", keys.join(", "));
    }
    let _ = write!(
        out,
        "\nisPluginExecutionCommand: `{}`",
        req.is_plugin_execution_command
    );
    if req.is_plugin_execution_command {
        out.push('\n');
        out.push_str(&result_config_log_string(&req.result_config));
    }
    out
}

/// Multi-line description of the outcome.
pub fn output_log_string(command: &ExecutionCommand, log_stdout_and_stderr: bool) -> String {
    let (current, previous, data) = command.update(|lc| {
        (
            lc.current_state(),
            lc.previous_state(),
            lc.result_data().clone(),
        )
    });

    let mut out = format!("{}:", command.label());
    let _ = write!(out, "\nPrevious State: `{previous}`");
    let _ = write!(out, "\nCurrent State: `{current}`");
    out.push('\n');
    out.push_str(&result_data_log_string(&data, log_stdout_and_stderr));
    out
}

pub fn result_data_log_string(data: &ResultData, log_stdout_and_stderr: bool) -> String {
    let mut out = String::new();
    if log_stdout_and_stderr {
        let _ = write!(out, "Stdout:\n```\n{}\n```\n", data.stdout());
        let _ = write!(out, "Stderr:\n```\n{}\n```\n", data.stderr());
    }
    let _ = write!(
        out,
        "Exit Code: `{}`",
        data.exit_code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    let _ = write!(out, "\nErr Code: `{}`", data.err_code());
    if data.is_state_failed() {
        let _ = write!(out, "\nErrmsg:\n```\n{}\n```", data.errors_log_string());
    }
    out
}

pub fn result_config_log_string(config: &ResultConfig) -> String {
    let mut out = format!("Result Pending: `{}`", config.result_pending);
    if let Some(dir) = &config.result_directory {
        let _ = write!(out, "\nResult Directory: `{}`", dir.display());
        let _ = write!(out, "\nResult Single File: `{}`", config.result_single_file);
        if let Some(basename) = &config.result_file_basename {
            let _ = write!(out, "\nResult File Basename: `{basename}`");
        }
        if let Some(suffix) = &config.result_files_suffix {
            let _ = write!(out, "\nResult Files Suffix: `{suffix}`");
        }
    }
    out
}

/// Markdown report of the whole command, shown to a human when something
/// went wrong.
pub fn markdown_report(command: &ExecutionCommand) -> String {
    let req = command.request();
    let (current, previous, pid, data) = command.update(|lc| {
        (
            lc.current_state(),
            lc.previous_state(),
            lc.pid(),
            lc.result_data().clone(),
        )
    });

    let mut md = format!("## {}\n", command.label());
    if let Some(pid) = pid {
        md.push_str(&md_entry("Pid", &pid.to_string()));
    }
    md.push_str(&md_entry("Previous State", previous.name()));
    md.push_str(&md_entry("Current State", current.name()));
    md.push_str(&md_entry("Executable", opt(req.executable.as_deref())));
    md.push_str(&arguments_markdown_string("Arguments", &req.arguments));
    md.push_str(&md_entry(
        "Working Directory",
        &req.working_directory
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string()),
    ));
    md.push_str(&md_entry("Runner", req.runner.name()));
    md.push_str(&md_entry("isFailsafe", &req.is_failsafe.to_string()));
    md.push_str(&md_entry(
        "isPluginExecutionCommand",
        &req.is_plugin_execution_command.to_string(),
    ));

    md.push_str("\n### Result\n\n");
    md.push_str(&md_code_entry("Stdout", data.stdout()));
    md.push_str(&md_code_entry("Stderr", data.stderr()));
    md.push_str(&md_entry(
        "Exit Code",
        &data
            .exit_code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string()),
    ));
    md.push_str(&md_entry("Err Code", &data.err_code().to_string()));
    if data.is_state_failed() {
        md.push_str(&md_code_entry("Errmsg", &data.errors_log_string()));
    }

    if let Some(desc) = &req.command_description {
        let _ = write!(md, "\n### Command Description\n\n{desc}\n");
    }
    if let Some(help) = &req.command_help {
        let _ = write!(md, "\n### Command Help\n\n{help}\n");
    }
    if let Some(help) = &req.plugin_api_help {
        let _ = write!(md, "\n### Plugin API Help\n\n{help}\n");
    }
    md
}

/// `Arguments:` followed by one `Arg N: ` line per argument.
pub fn arguments_log_string(label: &str, arguments: &[String]) -> String {
    if arguments.is_empty() {
        return format!("{label}: -");
    }
    let mut out = format!("{label}:\n```\n");
    for (i, arg) in arguments.iter().enumerate() {
        let _ = writeln!(out, "Arg {}: `{arg}`", i + 1);
    }
    out.push_str("```");
    out
}

fn arguments_markdown_string(label: &str, arguments: &[String]) -> String {
    if arguments.is_empty() {
        return format!("**{label}:** -  \n");
    }
    let mut out = format!("**{label}:**\n");
    for (i, arg) in arguments.iter().enumerate() {
        out.push_str(&md_code_entry(&format!("Arg {}", i + 1), arg));
    }
    out
}

pub(crate) fn md_entry(label: &str, value: &str) -> String {
    format!("**{label}**: `{value}`  \n")
}

pub(crate) fn md_code_entry(label: &str, value: &str) -> String {
    if value.is_empty() {
        return format!("**{label}**: -  \n");
    }
    format!("**{label}**:\n```\n{value}\n```\n")
}

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
