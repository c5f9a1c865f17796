#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use termexec::command::{ExecutionCommand, ExecutionRequest};
use termexec::config::{ConfigFile, RawConfigFile};
use termexec::errors::Result;
use termexec::shell::{DefaultShellEnvironment, ShellSettings};
use termexec::types::{CommandId, Runner};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_search_path(mut self, dirs: &[&str]) -> Self {
        self.config.shell.search_path = dirs.iter().map(PathBuf::from).collect();
        self
    }

    pub fn with_login_shells(mut self, shells: &[&str]) -> Self {
        self.config.shell.login_shells = shells.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_fallback_shell(mut self, path: &str) -> Self {
        self.config.shell.fallback_shell = PathBuf::from(path);
        self
    }

    pub fn with_home(mut self, path: &str) -> Self {
        self.config.shell.home = Some(PathBuf::from(path));
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.config.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_result_dir(mut self, path: &str) -> Self {
        self.config.result.directory = Some(PathBuf::from(path));
        self
    }

    pub fn with_result_basename(mut self, name: &str) -> Self {
        self.config.result.file_basename = Some(name.to_string());
        self
    }

    pub fn with_result_suffix(mut self, suffix: &str) -> Self {
        self.config.result.files_suffix = Some(suffix.to_string());
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ExecutionRequest` / `ExecutionCommand`.
pub struct RequestBuilder {
    request: ExecutionRequest,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            request: ExecutionRequest::default(),
        }
    }

    /// Request for `executable` with `args`.
    pub fn exec(executable: &str, args: &[&str]) -> Self {
        Self::new().executable(executable).args(args)
    }

    pub fn executable(mut self, executable: &str) -> Self {
        self.request.executable = Some(executable.to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.request
            .arguments
            .extend(args.iter().map(|a| a.to_string()));
        self
    }

    pub fn id(mut self, id: u64) -> Self {
        self.request.id = Some(CommandId(id));
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.request.command_label = Some(label.to_string());
        self
    }

    pub fn stdin(mut self, stdin: &str) -> Self {
        self.request.stdin = Some(stdin.to_string());
        self
    }

    pub fn working_directory(mut self, dir: &str) -> Self {
        self.request.working_directory = Some(PathBuf::from(dir));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.request
            .environment
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn failsafe(mut self, val: bool) -> Self {
        self.request.is_failsafe = val;
        self
    }

    pub fn runner(mut self, runner: Runner) -> Self {
        self.request.runner = runner;
        self
    }

    pub fn stdout_from_transcript(mut self, val: bool) -> Self {
        self.request.stdout_from_transcript = val;
        self
    }

    pub fn transcript_rows(mut self, rows: usize) -> Self {
        self.request.terminal_transcript_rows = Some(rows);
        self
    }

    pub fn result_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.request.result_config.result_directory = Some(dir.into());
        self
    }

    pub fn build(self) -> ExecutionRequest {
        self.request
    }

    pub fn command(self) -> Arc<ExecutionCommand> {
        Arc::new(ExecutionCommand::new(self.request))
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ShellSettings` with an empty environment and no home.
pub struct ShellSettingsBuilder {
    settings: ShellSettings,
}

impl ShellSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: ShellSettings::default(),
        }
    }

    pub fn search_path(mut self, dirs: &[&str]) -> Self {
        self.settings.search_path = dirs.iter().map(PathBuf::from).collect();
        self
    }

    pub fn login_shells(mut self, shells: &[&str]) -> Self {
        self.settings.login_shells = shells.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn fallback_shell(mut self, path: &str) -> Self {
        self.settings.fallback_shell = PathBuf::from(path);
        self
    }

    pub fn home(mut self, path: &str) -> Self {
        self.settings.home = Some(PathBuf::from(path));
        self
    }

    pub fn default_working_directory(mut self, path: &str) -> Self {
        self.settings.default_working_directory = Some(PathBuf::from(path));
        self
    }

    pub fn remap_shebangs(mut self, val: bool) -> Self {
        self.settings.remap_shebangs = val;
        self
    }

    pub fn variable(mut self, key: &str, value: &str) -> Self {
        self.settings
            .variables
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> ShellSettings {
        self.settings
    }

    pub fn environment(self) -> Arc<DefaultShellEnvironment> {
        Arc::new(DefaultShellEnvironment::new(self.settings))
    }
}

impl Default for ShellSettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
