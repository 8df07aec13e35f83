#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn logpipe() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_logpipe"));
    command.env_remove("LOGPIPE_LOG_PATTERN");
    command.env_remove("LOGPIPE_LOG_LEVEL");
    command
}

fn run_child_demo(run_args: &[&str], demo_args: &[&str]) -> Output {
    let mut command = logpipe();
    command
        .arg("run")
        .arg("--with-logger-name")
        .args(run_args)
        .arg("--")
        .arg(env!("CARGO_BIN_EXE_logpipe"))
        .arg("child-demo")
        .args(demo_args);
    command.output().expect("logpipe run should execute")
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn relays_shipped_lines_and_trace_after_profile_push() {
    let output = run_child_demo(&["--log-pattern", "*:TRACE", "--name", "demo"], &[]);
    let stdout = stdout_of(&output);

    assert!(
        output.status.success(),
        "stdout: {stdout}\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    for expected in [
        "foo-info",
        "bar-info",
        "foo-in-thread",
        "bar-in-thread",
        "foo-trace-yes",
        "bar-trace-yes",
        "from tracing",
        "answer = 42",
    ] {
        assert!(stdout.contains(expected), "missing {expected:?} in:\n{stdout}");
    }
    assert!(stdout.contains("[foo]"));
    assert!(stdout.contains("[textOutputSink]"));
    assert!(stdout.contains("line = Here's some stdout"));
    assert!(stdout.contains("line = Here's some stderr"));
}

#[test]
fn default_pattern_hides_trace_and_stdout_relay() {
    let output = run_child_demo(&[], &["--wait-ms", "200"]);
    let stdout = stdout_of(&output);

    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("foo-info"));
    assert!(!stdout.contains("foo-trace-no"));
    assert!(!stdout.contains("foo-trace-yes"));
    // stdout is relayed at TRACE, stderr at ERROR
    assert!(!stdout.contains("Here's some stdout"));
    assert!(stdout.contains("Here's some stderr"));
}

#[test]
fn msgpack_encoding_works_end_to_end() {
    let output = run_child_demo(
        &["--marshalizer", "msgpack", "--log-pattern", "*:TRACE"],
        &["--marshalizer", "msgpack"],
    );
    let stdout = stdout_of(&output);

    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("foo-info"));
    assert!(stdout.contains("foo-trace-yes"));
}

#[test]
fn propagates_child_exit_code() {
    let output = logpipe()
        .args(["run", "--", "sh", "-c", "echo out; echo err >&2; exit 7"])
        .output()
        .expect("logpipe run should execute");

    assert_eq!(output.status.code(), Some(7));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("line = err"));
    assert!(!stdout.contains("line = out"));
}

#[test]
fn relays_plain_stdout_at_trace() {
    let output = logpipe()
        .args([
            "run",
            "--log-pattern",
            "*:TRACE",
            "--name",
            "shell",
            "--",
            "sh",
            "-c",
            "echo hello",
        ])
        .output()
        .expect("logpipe run should execute");

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("shell"));
    assert!(stdout_of(&output).contains("line = hello"));
}

#[test]
fn invalid_pattern_is_usage_error() {
    let output = logpipe()
        .args(["run", "--log-pattern", "nonsense", "--", "true"])
        .output()
        .expect("logpipe run should execute");

    assert_eq!(output.status.code(), Some(64));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid log level pattern"));
}

#[test]
fn missing_program_is_not_found() {
    let output = logpipe()
        .args(["run", "--", "/nonexistent/logpipe-missing-program"])
        .output()
        .expect("logpipe run should execute");

    assert_eq!(output.status.code(), Some(127));
}

#[test]
fn version_prints_package_version() {
    let output = logpipe()
        .arg("version")
        .output()
        .expect("logpipe version should execute");

    assert!(output.status.success());
    assert_eq!(
        stdout_of(&output).trim(),
        format!("logpipe {}", env!("CARGO_PKG_VERSION"))
    );
}
