// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - relative paths where absolute ones are required,
///   - login shell names that are paths,
///   - invalid `[env]` variable names,
///   - result file names containing `/`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load the explicitly requested config, or the default one if it exists.
///
/// An explicit path must exist. A missing default config yields
/// [`ConfigFile::default`].
pub fn load_or_default(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return load_and_validate(path);
    }

    let path = default_config_path();
    if path.is_file() {
        debug!(path = %path.display(), "loading default config");
        load_and_validate(&path)
    } else {
        debug!(path = %path.display(), "no config file; using defaults");
        Ok(ConfigFile::default())
    }
}

/// Helper to resolve a default config path.
///
/// `$TERMEXEC_CONFIG` if set, otherwise `Termexec.toml` in the current
/// working directory.
pub fn default_config_path() -> PathBuf {
    std::env::var_os("TERMEXEC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Termexec.toml"))
}
