// src/shell/environment.rs

//! The shell environment collaborator: where to look for shells, which
//! directory to start in, and which variables a process gets.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::command::ExecutionCommand;

pub const DEFAULT_FALLBACK_SHELL: &str = "/bin/sh";
pub const DEFAULT_SEARCH_PATH: &[&str] = &["/usr/local/bin", "/usr/bin", "/bin"];
pub const DEFAULT_LOGIN_SHELLS: &[&str] = &["bash", "zsh", "fish", "sh"];

/// Pluggable source of everything `prepare` needs to know about the host.
pub trait ShellEnvironment: Send + Sync + fmt::Debug {
    /// Directories searched for login shells and bare executable names.
    fn search_path(&self) -> Vec<PathBuf>;

    /// Login-shell binary names in priority order.
    fn login_shells(&self) -> Vec<String>;

    /// Interpreter used when no login shell is found or in failsafe mode.
    fn fallback_shell(&self) -> PathBuf {
        PathBuf::from(DEFAULT_FALLBACK_SHELL)
    }

    fn default_working_directory(&self) -> Option<PathBuf>;

    /// Whether `#!/usr/...` and `#!/bin/...` interpreters that do not exist
    /// should be looked up on the search path instead.
    fn remap_shebangs(&self) -> bool {
        false
    }

    /// Base variables for `command`. Caller overrides are merged on top of
    /// these by `prepare`.
    fn environment(
        &self,
        command: &ExecutionCommand,
        working_directory: &Path,
    ) -> BTreeMap<String, String>;
}

/// Plain settings backing [`DefaultShellEnvironment`], usually built from the
/// `[shell]` and `[env]` config sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellSettings {
    pub search_path: Vec<PathBuf>,
    pub login_shells: Vec<String>,
    pub fallback_shell: PathBuf,
    pub default_working_directory: Option<PathBuf>,
    pub home: Option<PathBuf>,
    pub tmp_dir: Option<PathBuf>,
    pub inherit_environment: bool,
    pub remap_shebangs: bool,
    /// Extra variables, applied after the built-in ones.
    pub variables: BTreeMap<String, String>,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            search_path: DEFAULT_SEARCH_PATH.iter().map(PathBuf::from).collect(),
            login_shells: DEFAULT_LOGIN_SHELLS.iter().map(|s| s.to_string()).collect(),
            fallback_shell: PathBuf::from(DEFAULT_FALLBACK_SHELL),
            default_working_directory: None,
            home: None,
            tmp_dir: None,
            inherit_environment: false,
            remap_shebangs: true,
            variables: BTreeMap::new(),
        }
    }
}

/// Settings-driven [`ShellEnvironment`].
#[derive(Debug, Clone, Default)]
pub struct DefaultShellEnvironment {
    settings: ShellSettings,
}

impl DefaultShellEnvironment {
    pub fn new(settings: ShellSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    fn path_variable(&self) -> String {
        self.settings
            .search_path
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl ShellEnvironment for DefaultShellEnvironment {
    fn search_path(&self) -> Vec<PathBuf> {
        self.settings.search_path.clone()
    }

    fn login_shells(&self) -> Vec<String> {
        self.settings.login_shells.clone()
    }

    fn fallback_shell(&self) -> PathBuf {
        self.settings.fallback_shell.clone()
    }

    fn default_working_directory(&self) -> Option<PathBuf> {
        self.settings
            .default_working_directory
            .clone()
            .or_else(|| self.settings.home.clone())
    }

    fn remap_shebangs(&self) -> bool {
        self.settings.remap_shebangs
    }

    fn environment(
        &self,
        command: &ExecutionCommand,
        working_directory: &Path,
    ) -> BTreeMap<String, String> {
        let mut vars: BTreeMap<String, String> = if self.settings.inherit_environment {
            std::env::vars().collect()
        } else {
            BTreeMap::new()
        };

        if let Some(home) = &self.settings.home {
            vars.insert("HOME".to_string(), home.display().to_string());
        }
        vars.entry("LANG".to_string())
            .or_insert_with(|| "en_US.UTF-8".to_string());
        vars.insert("PATH".to_string(), self.path_variable());
        vars.insert(
            "PWD".to_string(),
            working_directory.display().to_string(),
        );
        if let Some(tmp) = &self.settings.tmp_dir {
            vars.insert("TMPDIR".to_string(), tmp.display().to_string());
        }

        if !command.request().runner.is_background() {
            vars.insert("TERM".to_string(), "xterm-256color".to_string());
            vars.insert("COLORTERM".to_string(), "truecolor".to_string());
        }

        for (key, value) in &self.settings.variables {
            vars.insert(key.clone(), value.clone());
        }

        vars
    }
}
