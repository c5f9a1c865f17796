// tests/result_data.rs

use termexec::command::{ExecutionCommand, ExecutionRequest, ResultData};
use termexec::errno::{Errno, SUCCESS_CODE};

#[test]
fn prepend_goes_before_append() {
    let mut data = ResultData::new();
    data.append_stdout("a");
    data.prepend_stdout("b");
    assert_eq!(data.stdout(), "ba");
}

#[test]
fn line_variants_add_newlines() {
    let mut data = ResultData::new();
    data.append_stderr_ln("second");
    data.prepend_stderr_ln("first");
    data.append_stderr("tail");
    assert_eq!(data.stderr(), "first\nsecond\ntail");

    data.clear_stderr();
    assert_eq!(data.stderr(), "");
}

#[test]
fn exit_code_is_recorded_once() {
    let mut data = ResultData::new();
    assert_eq!(data.exit_code(), None);
    assert!(data.set_exit_code(3));
    assert!(!data.set_exit_code(137));
    assert_eq!(data.exit_code(), Some(3));
}

#[test]
fn fresh_data_reports_success_code() {
    let data = ResultData::new();
    assert!(!data.is_state_failed());
    assert_eq!(data.err_code(), SUCCESS_CODE);
    assert!(data.errors().is_empty());
    assert_eq!(data.errors_log_string(), "");
}

#[test]
fn err_code_follows_the_latest_failure() {
    let cmd = ExecutionCommand::new(ExecutionRequest::default());
    cmd.set_state_failed_errno(Errno::INVALID_WORKING_DIRECTORY, &[&"/nope", &"x"]);
    cmd.set_state_failed_errno(Errno::SPAWN_FAILED, &[&"/bin/x", &"x"]);

    let data = cmd.result_data();
    assert_eq!(data.errors().len(), 2);
    assert_eq!(data.err_code(), Errno::SPAWN_FAILED.code);
    assert!(data.errors_log_string().contains("/nope"));
}
