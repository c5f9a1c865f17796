// tests/shell_resolve.rs

use std::path::PathBuf;

use termexec::errno::Errno;
use termexec::fs::mock::MockFileSystem;
use termexec::shell::{build_environment, prepare};
use termexec::types::Runner;
use termexec_test_utils::builders::{RequestBuilder, ShellSettingsBuilder};
use termexec_test_utils::init_tracing;

const ELF: &[u8] = b"\x7fELF\x02\x01\x01\x00\x00\x00";

/// `/bin/bash` and `/bin/sh` installed, home at `/home/me`.
fn host_fs() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_executable("/bin/bash", ELF);
    fs.add_executable("/bin/sh", ELF);
    fs.add_dir("/home/me");
    fs
}

fn settings() -> ShellSettingsBuilder {
    ShellSettingsBuilder::new()
        .search_path(&["/usr/bin", "/bin"])
        .login_shells(&["bash", "sh"])
        .home("/home/me")
}

#[test]
fn no_executable_starts_a_login_shell() {
    init_tracing();
    let fs = host_fs();
    let env = settings().environment();
    let cmd = RequestBuilder::new().command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");

    assert_eq!(inv.executable, PathBuf::from("/bin/bash"));
    assert!(inv.is_login_shell);
    assert_eq!(inv.process_name, "-bash");
    assert_eq!(inv.arguments, vec!["-bash".to_string()]);
    assert_eq!(inv.working_directory, PathBuf::from("/home/me"));
    assert_eq!(cmd.label(), "-bash");
}

#[test]
fn failsafe_uses_the_fallback_shell_without_login_marker() {
    let fs = host_fs();
    let env = settings().environment();
    let cmd = RequestBuilder::new().failsafe(true).command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");

    assert_eq!(inv.executable, PathBuf::from("/bin/sh"));
    assert!(!inv.is_login_shell);
    assert_eq!(inv.process_name, "sh");
}

#[test]
fn shell_priority_wins_over_search_path_order() {
    let fs = host_fs();
    fs.add_executable("/usr/bin/zsh", ELF);
    let env = settings().login_shells(&["bash", "zsh"]).environment();
    let cmd = RequestBuilder::new().command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert_eq!(inv.executable, PathBuf::from("/bin/bash"));
}

#[test]
fn missing_fallback_shell_is_reported() {
    let fs = MockFileSystem::new();
    fs.add_dir("/home/me");
    let env = settings().environment();
    let cmd = RequestBuilder::new().command();

    let err = prepare(&cmd, env.as_ref(), &fs).expect_err("nothing to run");
    assert_eq!(err.code(), Errno::EXECUTABLE_NOT_FOUND.code);
    assert!(err.message().contains("/bin/sh"));
}

#[test]
fn bare_names_are_looked_up_on_the_search_path() {
    let fs = host_fs();
    fs.add_executable("/usr/bin/tool", ELF);
    let env = settings().environment();
    let cmd = RequestBuilder::exec("tool", &["--flag"]).command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert_eq!(inv.executable, PathBuf::from("/usr/bin/tool"));
    assert_eq!(inv.arguments, vec!["tool".to_string(), "--flag".to_string()]);
    assert_eq!(inv.args(), ["--flag".to_string()]);
}

#[test]
fn caller_environment_overrides_shell_variables() {
    let fs = host_fs();
    let env = settings().variable("FOO", "base").environment();
    let cmd = RequestBuilder::exec("/bin/bash", &[])
        .env("FOO", "override")
        .env("A_FIRST", "1")
        .command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");

    assert!(inv.environment.contains(&"FOO=override".to_string()));
    assert!(!inv.environment.contains(&"FOO=base".to_string()));
    assert!(inv.environment.contains(&"PATH=/usr/bin:/bin".to_string()));
    assert!(inv.environment.contains(&"HOME=/home/me".to_string()));
    assert!(inv.environment.contains(&"PWD=/home/me".to_string()));
    assert!(inv.environment.contains(&"TERM=xterm-256color".to_string()));

    let mut sorted = inv.environment.clone();
    sorted.sort();
    assert_eq!(inv.environment, sorted);
    assert_eq!(inv.environment.first().map(String::as_str), Some("A_FIRST=1"));
}

#[test]
fn background_commands_get_no_terminal_variables() {
    let fs = host_fs();
    let env = settings().environment();
    let cmd = RequestBuilder::exec("/bin/bash", &[])
        .runner(Runner::AppShell)
        .command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert!(!inv.environment.iter().any(|e| e.starts_with("TERM=")));
}

#[test]
fn override_wins_in_build_environment() {
    let base = [("B".to_string(), "1".to_string()), ("A".to_string(), "1".to_string())]
        .into_iter()
        .collect();
    let overrides = [("B".to_string(), "2".to_string())].into_iter().collect();

    assert_eq!(build_environment(base, &overrides), vec!["A=1", "B=2"]);
}

#[test]
fn invalid_working_directory_is_reported() {
    let fs = host_fs();
    fs.add_file("/home/me/notes.txt", "hi");
    let env = settings().environment();

    for dir in ["/does/not/exist", "/home/me/notes.txt"] {
        let cmd = RequestBuilder::exec("/bin/bash", &[])
            .working_directory(dir)
            .command();
        let err = prepare(&cmd, env.as_ref(), &fs).expect_err("bad working directory");
        assert_eq!(err.code(), Errno::INVALID_WORKING_DIRECTORY.code);
        assert!(err.message().contains(dir));
    }
}

#[test]
fn working_directory_falls_back_to_root() {
    let fs = host_fs();
    let env = ShellSettingsBuilder::new()
        .search_path(&["/bin"])
        .environment();
    let cmd = RequestBuilder::exec("/bin/bash", &[]).command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert_eq!(inv.working_directory, PathBuf::from("/"));
}

#[test]
fn scripts_without_shebang_run_under_the_fallback_shell() {
    let fs = host_fs();
    fs.add_executable("/home/me/run.sh", "echo hello\n");
    let env = settings().environment();
    let cmd = RequestBuilder::exec("/home/me/run.sh", &["x"]).command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert_eq!(inv.executable, PathBuf::from("/bin/sh"));
    assert_eq!(
        inv.arguments,
        vec!["sh".to_string(), "/home/me/run.sh".to_string(), "x".to_string()]
    );
}

#[test]
fn missing_shebang_interpreter_is_found_on_the_search_path() {
    let fs = host_fs();
    fs.add_executable("/bin/python3", ELF);
    fs.add_executable("/home/me/tool.py", "#!/usr/bin/python3 -u\nprint('hi')\n");
    let env = settings().environment();
    let cmd = RequestBuilder::exec("/home/me/tool.py", &[]).command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert_eq!(inv.executable, PathBuf::from("/bin/python3"));
    assert_eq!(inv.arguments[1], "/home/me/tool.py");
}

#[test]
fn present_shebang_interpreter_is_left_to_the_os() {
    let fs = host_fs();
    fs.add_executable("/home/me/tool.sh", "#!/bin/sh\necho hi\n");
    let env = settings().environment();
    let cmd = RequestBuilder::exec("/home/me/tool.sh", &[]).command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert_eq!(inv.executable, PathBuf::from("/home/me/tool.sh"));
}

#[test]
fn shebang_remapping_can_be_disabled() {
    let fs = host_fs();
    fs.add_executable("/home/me/run.sh", "echo hello\n");
    let env = settings().remap_shebangs(false).environment();
    let cmd = RequestBuilder::exec("/home/me/run.sh", &[]).command();

    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert_eq!(inv.executable, PathBuf::from("/home/me/run.sh"));
    assert_eq!(inv.process_name, "run.sh");
}

#[test]
fn file_uris_are_accepted_and_others_rejected() {
    let fs = host_fs();
    let env = settings().environment();

    let mut request = RequestBuilder::new().build();
    request.executable_uri = Some(url::Url::parse("file:///bin/bash").expect("uri"));
    let cmd = termexec::command::ExecutionCommand::new(request.clone());
    let inv = prepare(&cmd, env.as_ref(), &fs).expect("prepare");
    assert_eq!(inv.executable, PathBuf::from("/bin/bash"));
    assert!(!inv.is_login_shell);

    request.executable_uri = Some(url::Url::parse("https://example.com/bash").expect("uri"));
    let cmd = termexec::command::ExecutionCommand::new(request);
    let err = prepare(&cmd, env.as_ref(), &fs).expect_err("not a file uri");
    assert_eq!(err.code(), Errno::INVALID_EXECUTABLE_URI.code);
}
