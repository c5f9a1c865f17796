// src/config/validate.rs

use std::path::Path;

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile, ResultSection, ShellSection};
use crate::errors::{Result, TermexecError};

const ENV_KEY_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::TermexecError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.shell, raw.env, raw.result))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_shell(&cfg.shell)?;
    validate_env(cfg)?;
    validate_result(&cfg.result)?;
    Ok(())
}

fn validate_shell(shell: &ShellSection) -> Result<()> {
    for dir in &shell.search_path {
        ensure_absolute("[shell].search_path entry", dir)?;
    }
    ensure_absolute("[shell].fallback_shell", &shell.fallback_shell)?;

    if shell.login_shells.is_empty() {
        return Err(TermexecError::ConfigError(
            "[shell].login_shells must name at least one shell".to_string(),
        ));
    }
    for name in &shell.login_shells {
        if name.is_empty() || name.contains('/') {
            return Err(TermexecError::ConfigError(format!(
                "[shell].login_shells entries must be bare names (got '{}')",
                name
            )));
        }
    }

    let optional_dirs = [
        ("[shell].default_working_directory", &shell.default_working_directory),
        ("[shell].home", &shell.home),
        ("[shell].tmp_dir", &shell.tmp_dir),
    ];
    for (what, dir) in optional_dirs {
        if let Some(dir) = dir {
            ensure_absolute(what, dir)?;
        }
    }

    Ok(())
}

fn validate_env(cfg: &RawConfigFile) -> Result<()> {
    let env_key = Regex::new(ENV_KEY_PATTERN).map_err(anyhow::Error::from)?;
    for key in cfg.env.keys() {
        if !env_key.is_match(key) {
            return Err(TermexecError::ConfigError(format!(
                "[env] has invalid variable name '{}'",
                key
            )));
        }
    }
    Ok(())
}

fn validate_result(result: &ResultSection) -> Result<()> {
    if let Some(dir) = &result.directory {
        ensure_absolute("[result].directory", dir)?;
    }

    if let Some(basename) = &result.file_basename {
        if basename.is_empty() || basename.contains('/') {
            return Err(TermexecError::ConfigError(format!(
                "[result].file_basename must be a non-empty file name (got '{}')",
                basename
            )));
        }
    }
    if result.single_file && result.file_basename.is_none() {
        return Err(TermexecError::ConfigError(
            "[result].single_file requires [result].file_basename".to_string(),
        ));
    }

    if let Some(suffix) = &result.files_suffix {
        if suffix.contains('/') {
            return Err(TermexecError::ConfigError(format!(
                "[result].files_suffix must not contain '/' (got '{}')",
                suffix
            )));
        }
    }

    Ok(())
}

fn ensure_absolute(what: &str, path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(TermexecError::ConfigError(format!(
            "{} must be an absolute path (got '{}')",
            what,
            path.display()
        )));
    }
    Ok(())
}
