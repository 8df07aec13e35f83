use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use logpipe_logger::{LogContext, LogContextLayer};
use logpipe_pipes::ChildPart;
use logpipe_transport::{inherited_file, CHILD_LOGS_WRITER_FD, CHILD_PROFILE_READER_FD};
use tracing_subscriber::layer::SubscriberExt;

use crate::cmd::ChildDemoArgs;
use crate::exit::{pipes_error, transport_error, CliError, CliResult, FAILURE, SUCCESS};

const TRACE_PATTERN: &str = "*:TRACE";
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run(args: ChildDemoArgs) -> CliResult<i32> {
    // SAFETY: nothing else in this process owns descriptors 3 and 4; they are
    // only present when launched by `logpipe run`.
    let profile_reader = unsafe { inherited_file(CHILD_PROFILE_READER_FD) }
        .map_err(|err| transport_error("profile reader", err))?;
    // SAFETY: as above.
    let logs_writer = unsafe { inherited_file(CHILD_LOGS_WRITER_FD) }
        .map_err(|err| transport_error("logs writer", err))?;

    let context = LogContext::global();
    let part = ChildPart::new(
        profile_reader,
        logs_writer,
        args.marshalizer.build(),
        Arc::clone(&context),
    )
    .map_err(|err| pipes_error("create child part", err))?;
    let workers = part
        .start_loop()
        .map_err(|err| pipes_error("start child part", err))?;

    let foo = context.get_or_create("foo");
    let bar = context.get_or_create("bar");

    foo.info("foo-info", &[]);
    bar.info("bar-info", &[]);
    foo.trace("foo-trace-no", &[]);
    bar.trace("bar-trace-no", &[]);

    let in_thread = {
        let context = Arc::clone(&context);
        thread::spawn(move || {
            context.get_or_create("foo").info("foo-in-thread", &[]);
            context.get_or_create("bar").info("bar-in-thread", &[]);
        })
    };
    if in_thread.join().is_err() {
        return Err(CliError::new(FAILURE, "logging thread panicked"));
    }

    let bridged = tracing_subscriber::registry().with(LogContextLayer::new(Arc::clone(&context)));
    tracing::subscriber::with_default(bridged, || {
        tracing::info!(target: "demo/tracing", answer = 42u64, "from tracing");
    });

    let traced = wait_for_pattern(&context, TRACE_PATTERN, Duration::from_millis(args.wait_ms));
    if traced {
        foo.trace("foo-trace-yes", &[]);
        bar.trace("bar-trace-yes", &[]);
    }

    println!("Here's some stdout");
    eprintln!("Here's some stderr");

    part.stop_loop();
    workers.join();
    Ok(SUCCESS)
}

fn wait_for_pattern(context: &LogContext, pattern: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if context.log_level_pattern() == pattern {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}
