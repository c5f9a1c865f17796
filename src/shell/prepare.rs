// src/shell/prepare.rs

//! Turn a requested command into a concrete process invocation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::command::ExecutionCommand;
use crate::errno::{Errno, Error};
use crate::fs::FileSystem;
use crate::shell::environment::ShellEnvironment;
use crate::shell::interpreter::interpreter_for;

/// Fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program actually handed to the OS.
    pub executable: PathBuf,
    /// Full argument vector; `arguments[0]` is the process name.
    pub arguments: Vec<String>,
    pub working_directory: PathBuf,
    /// `KEY=VALUE` entries, sorted.
    pub environment: Vec<String>,
    pub is_login_shell: bool,
    pub process_name: String,
    pub stdin: Option<String>,
}

impl Invocation {
    /// `(key, value)` pairs in the sorted order of [`Invocation::environment`].
    pub fn environment_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.environment
            .iter()
            .filter_map(|entry| entry.split_once('='))
    }

    /// Arguments after the process name.
    pub fn args(&self) -> &[String] {
        self.arguments.get(1..).unwrap_or(&[])
    }
}

/// Resolve executable, argument vector, working directory and environment
/// for `command`.
///
/// On failure the returned [`Error`] is meant to be recorded on the command
/// with `set_state_failed`; nothing is recorded here.
pub fn prepare(
    command: &ExecutionCommand,
    env: &dyn ShellEnvironment,
    fs: &dyn FileSystem,
) -> Result<Invocation, Error> {
    let label = command.label();
    let request = command.request();

    let (executable, is_login_shell) = resolve_executable(command, env, fs, &label)?;

    let mut command_args: Vec<String> = Vec::with_capacity(request.arguments.len() + 2);
    let executable = if env.remap_shebangs() {
        match interpreter_for(fs, &executable, env) {
            Some(interpreter) => {
                debug!(
                    command = %label,
                    file = %executable.display(),
                    interpreter = %interpreter.display(),
                    "running file through interpreter"
                );
                command_args.push(executable.display().to_string());
                interpreter
            }
            None => executable,
        }
    } else {
        executable
    };
    command_args.extend(request.arguments.iter().cloned());

    let basename = executable
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| executable.display().to_string());
    let process_name = if is_login_shell {
        format!("-{basename}")
    } else {
        basename
    };

    let mut arguments = Vec::with_capacity(command_args.len() + 1);
    arguments.push(process_name.clone());
    arguments.extend(command_args);

    let working_directory = resolve_working_directory(command, env, fs, &label)?;
    let environment = build_environment(
        env.environment(command, &working_directory),
        &request.environment,
    );

    command.set_default_label(&process_name);

    info!(
        command = %command.label(),
        executable = %executable.display(),
        login_shell = is_login_shell,
        cwd = %working_directory.display(),
        "prepared invocation"
    );

    Ok(Invocation {
        executable,
        arguments,
        working_directory,
        environment,
        is_login_shell,
        process_name,
        stdin: request.stdin.clone(),
    })
}

fn resolve_executable(
    command: &ExecutionCommand,
    env: &dyn ShellEnvironment,
    fs: &dyn FileSystem,
    label: &str,
) -> Result<(PathBuf, bool), Error> {
    let request = command.request();

    if let Some(exe) = request.executable.as_deref().filter(|e| !e.is_empty()) {
        let path = PathBuf::from(exe);
        // Bare names are looked up on the search path; anything else is
        // taken as is and left for the spawn to reject.
        if path.components().count() == 1 && !path.is_absolute() {
            if let Some(found) = find_on_search_path(fs, env, exe) {
                return Ok((found, false));
            }
        }
        return Ok((path, false));
    }

    if let Some(uri) = &request.executable_uri {
        if uri.scheme() != "file" {
            return Err(Errno::INVALID_EXECUTABLE_URI.error(&[uri]));
        }
        return match uri.to_file_path() {
            Ok(path) => Ok((path, false)),
            Err(()) => Err(Errno::INVALID_EXECUTABLE_URI.error(&[uri])),
        };
    }

    if !request.is_failsafe {
        if let Some(shell) = find_login_shell(fs, env) {
            return Ok((shell, true));
        }
    }

    let fallback = env.fallback_shell();
    if !fs.is_executable(&fallback) {
        return Err(Errno::EXECUTABLE_NOT_FOUND.error(&[&label, &fallback.display()]));
    }
    Ok((fallback, false))
}

/// First login shell, in shell priority order, found in any search path
/// directory.
fn find_login_shell(fs: &dyn FileSystem, env: &dyn ShellEnvironment) -> Option<PathBuf> {
    let dirs = env.search_path();
    env.login_shells().iter().find_map(|shell| {
        dirs.iter()
            .map(|dir| dir.join(shell))
            .find(|candidate| fs.is_executable(candidate))
    })
}

/// First executable named `name` in the search path.
pub(crate) fn find_on_search_path(
    fs: &dyn FileSystem,
    env: &dyn ShellEnvironment,
    name: &str,
) -> Option<PathBuf> {
    env.search_path()
        .into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| fs.is_executable(candidate))
}

fn resolve_working_directory(
    command: &ExecutionCommand,
    env: &dyn ShellEnvironment,
    fs: &dyn FileSystem,
    label: &str,
) -> Result<PathBuf, Error> {
    let dir = command
        .request()
        .working_directory
        .clone()
        .filter(|d| !d.as_os_str().is_empty())
        .or_else(|| env.default_working_directory())
        .unwrap_or_else(|| PathBuf::from("/"));

    if !fs.is_dir(&dir) {
        return Err(Errno::INVALID_WORKING_DIRECTORY.error(&[&dir.display(), &label]));
    }
    Ok(dir)
}

/// Merge `overrides` over `base` and render sorted `KEY=VALUE` entries.
pub fn build_environment(
    base: BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> Vec<String> {
    let mut merged = base;
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }

    let mut entries: Vec<String> = merged
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    entries.sort();
    entries
}
