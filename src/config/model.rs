// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::command::ResultConfig;
use crate::shell::ShellSettings;
use crate::shell::environment::{DEFAULT_FALLBACK_SHELL, DEFAULT_LOGIN_SHELLS, DEFAULT_SEARCH_PATH};

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [shell]
/// search_path = ["/usr/local/bin", "/usr/bin", "/bin"]
/// login_shells = ["bash", "sh"]
/// fallback_shell = "/bin/sh"
/// home = "/home/me"
///
/// [env]
/// EDITOR = "vi"
///
/// [result]
/// directory = "/tmp/results"
/// files_suffix = "-1"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub shell: ShellSection,

    /// Variables added to every command's environment.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    #[serde(default)]
    pub result: ResultSection,
}

/// `[shell]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellSection {
    /// Directories searched for login shells and bare executable names.
    pub search_path: Vec<PathBuf>,

    /// Login shell names in priority order.
    pub login_shells: Vec<String>,

    /// Used when no login shell is found, and always in failsafe mode.
    pub fallback_shell: PathBuf,

    /// Working directory for commands that don't set one. Falls back to
    /// `home`, then `/`.
    pub default_working_directory: Option<PathBuf>,

    pub home: Option<PathBuf>,
    pub tmp_dir: Option<PathBuf>,

    /// Start from the environment of the `termexec` process itself.
    pub inherit_environment: bool,

    /// Look up missing `#!/usr/...` and `#!/bin/...` interpreters on the
    /// search path.
    pub remap_shebangs: bool,
}

impl Default for ShellSection {
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
        }
    }
}

/// `[result]` section: where finished commands deliver their result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResultSection {
    pub directory: Option<PathBuf>,
    pub single_file: bool,
    pub file_basename: Option<String>,
    pub files_suffix: Option<String>,
    /// Single-file template for commands that did not fail.
    pub output_format: Option<String>,
    /// Single-file template for failed commands.
    pub error_format: Option<String>,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`) or
/// [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    shell: ShellSection,
    env: BTreeMap<String, String>,
    result: ResultSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        shell: ShellSection,
        env: BTreeMap<String, String>,
        result: ResultSection,
    ) -> Self {
        Self { shell, env, result }
    }

    pub fn shell(&self) -> &ShellSection {
        &self.shell
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn result(&self) -> &ResultSection {
        &self.result
    }

    /// Settings for [`crate::shell::DefaultShellEnvironment`].
    pub fn shell_settings(&self) -> ShellSettings {
        let shell = &self.shell;
        ShellSettings {
            search_path: shell.search_path.clone(),
            login_shells: shell.login_shells.clone(),
            fallback_shell: shell.fallback_shell.clone(),
            default_working_directory: shell.default_working_directory.clone(),
            home: shell.home.clone(),
            tmp_dir: shell.tmp_dir.clone(),
            inherit_environment: shell.inherit_environment,
            remap_shebangs: shell.remap_shebangs,
            variables: self.env.clone(),
        }
    }

    /// Result delivery settings, before any per-command overrides.
    pub fn result_config(&self) -> ResultConfig {
        let result = &self.result;
        ResultConfig {
            result_pending: false,
            result_directory: result.directory.clone(),
            result_single_file: result.single_file,
            result_file_basename: result.file_basename.clone(),
            result_files_suffix: result.files_suffix.clone(),
            result_file_output_format: result.output_format.clone(),
            result_file_error_format: result.error_format.clone(),
        }
    }
}
