// src/result/sender.rs

//! Writing finalized results into a result directory.
//!
//! Two layouts are supported:
//!
//! - per-stream files: `stdout<suffix>`, `stderr<suffix>`,
//!   `exit_code<suffix>` and `errmsg<suffix>` (each only when non-empty),
//!   followed by `err<suffix>` holding the error code. `err` is written last
//!   through a temp file and a rename, so a watcher can wait for it and then
//!   read the rest.
//! - a single formatted file named by the configured basename, also written
//!   through a temp file and a rename.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use crate::command::report::{md_code_entry, md_entry};
use crate::command::{ResultConfig, ResultData};
use crate::errno::{Errno, Error};
use crate::errors::{Result, TermexecError};
use crate::fs::FileSystem;

pub const STDOUT_FILE: &str = "stdout";
pub const STDERR_FILE: &str = "stderr";
pub const EXIT_CODE_FILE: &str = "exit_code";
pub const ERRMSG_FILE: &str = "errmsg";
pub const ERR_FILE: &str = "err";

/// Values a result file format can refer to as `{stdout}`, `{stderr}`,
/// `{exit_code}`, `{err_code}` and `{errmsg}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResultFields {
    stdout: String,
    stderr: String,
    exit_code: String,
    err_code: String,
    errmsg: String,
}

impl ResultFields {
    fn from_data(data: &ResultData) -> Self {
        Self {
            stdout: data.stdout().to_string(),
            stderr: data.stderr().to_string(),
            exit_code: data.exit_code().map(|c| c.to_string()).unwrap_or_default(),
            err_code: data.err_code().to_string(),
            errmsg: if data.is_state_failed() {
                data.errors_log_string()
            } else {
                String::new()
            },
        }
    }

    fn render(&self, format: &str) -> String {
        format
            .replace("{stdout}", &self.stdout)
            .replace("{stderr}", &self.stderr)
            .replace("{exit_code}", &self.exit_code)
            .replace("{err_code}", &self.err_code)
            .replace("{errmsg}", &self.errmsg)
    }
}

/// Deliver `data` for the command labelled `label` as described by `config`.
pub fn send_result(
    fs: &dyn FileSystem,
    label: &str,
    config: &ResultConfig,
    data: &ResultData,
) -> Result<()> {
    let Some(dir) = config.result_directory.as_deref() else {
        return Err(TermexecError::ConfigError(format!(
            "no result directory configured for '{label}'"
        )));
    };

    ensure_directory(fs, dir)?;
    debug!(
        command = %label,
        dir = %dir.display(),
        single_file = config.result_single_file,
        "writing result"
    );

    let fields = ResultFields::from_data(data);
    if config.result_single_file {
        write_single_file(fs, dir, config, data, &fields)?;
    } else {
        write_result_files(fs, dir, config, data, &fields)?;
    }

    info!(command = %label, dir = %dir.display(), "result written");
    Ok(())
}

fn ensure_directory(fs: &dyn FileSystem, dir: &Path) -> Result<()> {
    if fs.is_dir(dir) {
        return Ok(());
    }
    fs.create_dir_all(dir)
        .map_err(|e| delivery(Errno::RESULT_DIRECTORY_INVALID.error_with_cause(&[&dir.display()], e)))?;
    if !fs.is_dir(dir) {
        return Err(delivery(Errno::RESULT_DIRECTORY_INVALID.error(&[&dir.display()])));
    }
    Ok(())
}

fn write_single_file(
    fs: &dyn FileSystem,
    dir: &Path,
    config: &ResultConfig,
    data: &ResultData,
    fields: &ResultFields,
) -> Result<()> {
    let basename = config.result_file_basename.as_deref().unwrap_or_default();
    if basename.is_empty() || basename.contains('/') {
        return Err(delivery(Errno::RESULT_FILE_BASENAME_INVALID.error(&[&basename])));
    }

    let custom = if data.is_state_failed() {
        &config.result_file_error_format
    } else {
        &config.result_file_output_format
    };
    let content = match custom.as_deref().filter(|f| !f.is_empty()) {
        Some(format) => fields.render(format),
        None if data.is_state_failed() => default_error_text(fields),
        None => default_output_text(fields),
    };

    write_atomically(fs, dir, basename, &content)
}

fn write_result_files(
    fs: &dyn FileSystem,
    dir: &Path,
    config: &ResultConfig,
    data: &ResultData,
    fields: &ResultFields,
) -> Result<()> {
    let suffix = config.result_files_suffix.as_deref().unwrap_or_default();
    if suffix.contains('/') {
        return Err(delivery(Errno::RESULT_FILES_SUFFIX_INVALID.error(&[&suffix])));
    }

    let mut files = vec![
        (STDOUT_FILE, &fields.stdout),
        (STDERR_FILE, &fields.stderr),
        (EXIT_CODE_FILE, &fields.exit_code),
    ];
    if data.is_state_failed() {
        files.push((ERRMSG_FILE, &fields.errmsg));
    }

    for (name, content) in files {
        if content.is_empty() {
            continue;
        }
        write_file(fs, &dir.join(format!("{name}{suffix}")), content)?;
    }

    write_atomically(fs, dir, &format!("{ERR_FILE}{suffix}"), &fields.err_code)
}

/// Write `content` to `dir/<name>-<millis>`, then move it to `dir/name`.
fn write_atomically(fs: &dyn FileSystem, dir: &Path, name: &str, content: &str) -> Result<()> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let temp = dir.join(format!("{name}-{millis}"));
    let target = dir.join(name);

    write_file(fs, &temp, content)?;
    fs.rename(&temp, &target).map_err(|e| {
        delivery(Errno::RESULT_WRITE_FAILED.error_with_cause(&[&target.display()], e))
    })
}

fn write_file(fs: &dyn FileSystem, path: &Path, content: &str) -> Result<()> {
    fs.write(path, content.as_bytes())
        .map_err(|e| delivery(Errno::RESULT_WRITE_FAILED.error_with_cause(&[&path.display()], e)))
}

fn default_output_text(fields: &ResultFields) -> String {
    if fields.stderr.is_empty() && fields.exit_code == "0" {
        return fields.stdout.clone();
    }
    if fields.stderr.is_empty() {
        return format!("{}\n\n{}", fields.stdout, md_entry("Exit Code", &fields.exit_code));
    }
    let mut out = md_code_entry("Stdout", &fields.stdout);
    out.push_str(&md_code_entry("Stderr", &fields.stderr));
    out.push_str(&md_entry("Exit Code", &fields.exit_code));
    out
}

fn default_error_text(fields: &ResultFields) -> String {
    let mut out = md_entry("Err Code", &fields.err_code);
    out.push_str(&md_code_entry("Errmsg", &fields.errmsg));
    out.push_str(&md_code_entry("Stdout", &fields.stdout));
    out.push_str(&md_code_entry("Stderr", &fields.stderr));
    out.push_str(&md_entry("Exit Code", &fields.exit_code));
    out
}

fn delivery(error: Error) -> TermexecError {
    TermexecError::ResultDelivery(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_every_placeholder() {
        let fields = ResultFields {
            stdout: "out".into(),
            stderr: "err".into(),
            exit_code: "3".into(),
            err_code: "0".into(),
            errmsg: String::new(),
        };
        assert_eq!(
            fields.render("{stdout}|{stderr}|{exit_code}|{err_code}|{errmsg}|{other}"),
            "out|err|3|0||{other}"
        );
    }

    #[test]
    fn default_output_is_plain_stdout_for_clean_success() {
        let fields = ResultFields {
            stdout: "hello\n".into(),
            stderr: String::new(),
            exit_code: "0".into(),
            err_code: "0".into(),
            errmsg: String::new(),
        };
        assert_eq!(default_output_text(&fields), "hello\n");
    }
}
