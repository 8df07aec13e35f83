use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;

use logpipe_logger::LogContext;
use logpipe_pipes::ParentPart;
use tracing::{debug, info};

use crate::cmd::RunArgs;
use crate::exit::{
    io_error, logger_error, pipes_error, CliError, CliResult, FAILURE, INTERNAL, SIGNAL_BASE,
};

pub fn run(args: RunArgs) -> CliResult<i32> {
    let context = LogContext::global();
    context
        .set_log_level(&args.log_pattern)
        .map_err(|err| logger_error("log pattern", err))?;
    context.toggle_logger_name(args.with_logger_name);
    context.toggle_correlation(args.with_correlation);

    let name = args.name.clone().unwrap_or_else(|| child_name(&args.program));
    let part = ParentPart::new(name, args.marshalizer.build(), Arc::clone(&context))
        .map_err(|err| pipes_error("create pipes", err))?;

    let mut command = Command::new(&args.program);
    command
        .args(&args.args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    part.configure_command(&mut command)
        .map_err(|err| pipes_error("configure child", err))?;

    let mut child = command
        .spawn()
        .map_err(|err| io_error(&format!("spawn {}", args.program.to_string_lossy()), err))?;
    part.release_child_pipes();
    info!(pid = child.id(), child = part.child_name(), "child started");

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| CliError::new(INTERNAL, "child stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| CliError::new(INTERNAL, "child stderr not captured"))?;

    let workers = match part.start_loop(stdout, stderr) {
        Ok(workers) => workers,
        Err(err) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(pipes_error("start relay", err));
        }
    };

    let status = child
        .wait()
        .map_err(|err| io_error("wait for child", err))?;
    debug!(%status, "child exited");

    // The child's ends are closed now, so every relay drains and sees end of stream.
    workers.join();
    part.stop_loop();

    Ok(exit_code(status))
}

fn child_name(program: &std::ffi::OsStr) -> String {
    Path::new(program)
        .file_name()
        .unwrap_or(program)
        .to_string_lossy()
        .into_owned()
}

fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(signal)) => SIGNAL_BASE + signal,
        (None, None) => FAILURE,
    }
}
