// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `termexec`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "termexec",
    version,
    about = "Run a command through its execution lifecycle and report the aggregated result.",
    long_about = None
)]
pub struct CliArgs {
    /// Executable to run. Bare names are looked up on the search path.
    ///
    /// If omitted, a login shell (or the fallback shell with `--failsafe`)
    /// is started.
    #[arg(value_name = "EXECUTABLE")]
    pub executable: Option<String>,

    /// Arguments passed to the executable.
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `$TERMEXEC_CONFIG`, else `Termexec.toml` in the current
    /// working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory for the command.
    #[arg(long, value_name = "DIR")]
    pub workdir: Option<PathBuf>,

    /// Human-readable label used in logs and reports.
    #[arg(long, value_name = "LABEL")]
    pub label: Option<String>,

    /// Numeric command identifier used in logs and reports.
    #[arg(long, value_name = "ID")]
    pub id: Option<u64>,

    /// Skip login shells and use the fallback shell.
    #[arg(long)]
    pub failsafe: bool,

    /// Extra environment variable; overrides the shell environment.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Text written to the command's stdin.
    #[arg(long, value_name = "TEXT")]
    pub stdin: Option<String>,

    /// Run as a background app-shell command instead of a terminal session.
    #[arg(long)]
    pub background: bool,

    /// Take stdout from the interleaved output transcript.
    #[arg(long)]
    pub transcript: bool,

    /// Keep only the last N transcript rows.
    #[arg(long, value_name = "N")]
    pub transcript_rows: Option<usize>,

    /// Forcibly terminate the command after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Write the result into this directory.
    #[arg(long, value_name = "DIR")]
    pub result_dir: Option<PathBuf>,

    /// Write a single formatted result file instead of one file per stream.
    #[arg(long)]
    pub result_single_file: bool,

    /// File name of the single result file.
    #[arg(long, value_name = "NAME")]
    pub result_basename: Option<String>,

    /// Suffix appended to every per-stream result file.
    #[arg(long, value_name = "SUFFIX")]
    pub result_suffix: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TERMEXEC_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the invocation, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_env_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_args_keep_their_dashes() {
        let args = CliArgs::try_parse_from([
            "termexec",
            "--env",
            "A=1",
            "--timeout",
            "5",
            "/bin/ls",
            "-la",
            "/tmp",
        ])
        .expect("valid args");

        assert_eq!(args.executable.as_deref(), Some("/bin/ls"));
        assert_eq!(args.args, vec!["-la".to_string(), "/tmp".to_string()]);
        assert_eq!(args.env, vec![("A".to_string(), "1".to_string())]);
        assert_eq!(args.timeout, Some(5));
    }

    #[test]
    fn env_pairs_need_a_key() {
        assert!(parse_env_pair("=x").is_err());
        assert!(parse_env_pair("noequals").is_err());
        assert_eq!(
            parse_env_pair("K=a=b"),
            Ok(("K".to_string(), "a=b".to_string()))
        );
    }
}
