// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use termexec::config::{ConfigFile, load_and_validate, load_or_default};
use termexec::errors::TermexecError;
use termexec_test_utils::builders::ConfigFileBuilder;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_config(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[test]
fn full_config_round_trips_into_settings() -> TestResult {
    let file = write_config(
        r#"
[shell]
search_path = ["/opt/bin", "/bin"]
login_shells = ["zsh"]
fallback_shell = "/bin/sh"
home = "/home/me"
remap_shebangs = false

[env]
EDITOR = "vi"

[result]
directory = "/tmp/results"
files_suffix = "-1"
"#,
    )?;

    let cfg = load_and_validate(file.path())?;
    let settings = cfg.shell_settings();
    assert_eq!(
        settings.search_path,
        vec![PathBuf::from("/opt/bin"), PathBuf::from("/bin")]
    );
    assert_eq!(settings.login_shells, vec!["zsh".to_string()]);
    assert_eq!(settings.home, Some(PathBuf::from("/home/me")));
    assert!(!settings.remap_shebangs);
    assert_eq!(settings.variables.get("EDITOR").map(String::as_str), Some("vi"));

    let result = cfg.result_config();
    assert_eq!(result.result_directory, Some(PathBuf::from("/tmp/results")));
    assert_eq!(result.result_files_suffix.as_deref(), Some("-1"));
    assert!(!result.result_single_file);
    Ok(())
}

#[test]
fn empty_config_uses_defaults() -> TestResult {
    let file = write_config("")?;
    let cfg = load_and_validate(file.path())?;
    let defaults = ConfigFile::default();

    assert_eq!(cfg.shell(), defaults.shell());
    assert_eq!(cfg.shell().fallback_shell, PathBuf::from("/bin/sh"));
    assert!(cfg.shell().remap_shebangs);
    assert!(cfg.env().is_empty());
    Ok(())
}

#[test]
fn explicit_missing_config_is_an_io_error() {
    let err = load_or_default(Some(PathBuf::from("/definitely/not/here.toml").as_path()))
        .expect_err("missing explicit config");
    assert!(matches!(err, TermexecError::IoError(_)));
}

#[test]
fn unknown_keys_are_rejected() -> TestResult {
    let file = write_config("[shell]\nsearch_paths = [\"/bin\"]\n")?;
    let err = load_and_validate(file.path()).expect_err("typo in key");
    assert!(matches!(err, TermexecError::TomlError(_)));
    Ok(())
}

#[test]
fn relative_paths_are_rejected() {
    let err = ConfigFileBuilder::new()
        .with_search_path(&["bin"])
        .try_build()
        .expect_err("relative search path");
    assert!(err.to_string().contains("search_path"));

    let err = ConfigFileBuilder::new()
        .with_result_dir("results")
        .try_build()
        .expect_err("relative result dir");
    assert!(err.to_string().contains("[result].directory"));
}

#[test]
fn login_shells_must_be_bare_names() {
    let err = ConfigFileBuilder::new()
        .with_login_shells(&["/bin/bash"])
        .try_build()
        .expect_err("path as shell name");
    assert!(matches!(err, TermexecError::ConfigError(_)));

    assert!(
        ConfigFileBuilder::new()
            .with_login_shells(&[])
            .try_build()
            .is_err()
    );
}

#[test]
fn env_keys_are_validated() {
    assert!(ConfigFileBuilder::new().with_env("GOOD_KEY_1", "x").try_build().is_ok());
    assert!(ConfigFileBuilder::new().with_env("1BAD", "x").try_build().is_err());
    assert!(ConfigFileBuilder::new().with_env("BAD-KEY", "x").try_build().is_err());
}

#[test]
fn result_file_names_cannot_contain_slashes() {
    assert!(
        ConfigFileBuilder::new()
            .with_result_basename("a/b")
            .try_build()
            .is_err()
    );
    assert!(
        ConfigFileBuilder::new()
            .with_result_suffix("x/")
            .try_build()
            .is_err()
    );
    let cfg = ConfigFileBuilder::new()
        .with_result_dir("/tmp/out")
        .with_result_suffix("-7")
        .build();
    assert_eq!(cfg.result().files_suffix.as_deref(), Some("-7"));
}
