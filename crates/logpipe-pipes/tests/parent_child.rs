#![cfg(unix)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use logpipe_logger::{
    JsonMarshalizer, LogContext, LogLevel, Marshalizer, MsgPackMarshalizer, PlainFormatter,
    WriterSink,
};
use logpipe_pipes::{ChildPart, ParentPart};

struct Pair {
    parent_context: Arc<LogContext>,
    child_context: Arc<LogContext>,
    parent: ParentPart,
    child: ChildPart,
    captured: Arc<WriterSink<Vec<u8>>>,
}

fn pair(marshalizer: Arc<dyn Marshalizer>) -> Pair {
    let parent_context = Arc::new(LogContext::new());
    let captured = Arc::new(WriterSink::new(Vec::new()));
    parent_context
        .output()
        .add_observer(captured.clone(), Arc::new(PlainFormatter));

    let parent = ParentPart::new("testchild", Arc::clone(&marshalizer), Arc::clone(&parent_context))
        .expect("parent part should build");
    let pipes = parent.take_child_pipes().expect("child pipes available");

    let child_context = Arc::new(LogContext::with_console());
    let child = ChildPart::new(
        pipes.profile_reader,
        pipes.logs_writer,
        marshalizer,
        Arc::clone(&child_context),
    )
    .expect("child part should build");

    Pair {
        parent_context,
        child_context,
        parent,
        child,
        captured,
    }
}

fn captured_text(pair: &Pair) -> String {
    pair.captured
        .with_inner(|buf| String::from_utf8_lossy(buf).into_owned())
}

fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(10));
    }
}

fn run_scenario(marshalizer: Arc<dyn Marshalizer>) {
    let pair = pair(marshalizer);
    let parent_workers = pair
        .parent
        .start_loop(std::io::empty(), std::io::empty())
        .expect("parent loop starts");
    let child_workers = pair.child.start_loop().expect("child loop starts");

    let foo = pair.child_context.get_or_create("foo");
    let bar = pair.child_context.get_or_create("bar");

    foo.info("foo-info", &[]);
    bar.info("bar-info", &[]);
    foo.trace("foo-trace-no", &[]);

    let in_thread = {
        let context = Arc::clone(&pair.child_context);
        thread::spawn(move || {
            context.get_or_create("foo").info("foo-in-thread", &[]);
        })
    };
    in_thread.join().expect("logging thread");

    wait_until("first lines", || {
        let text = captured_text(&pair);
        text.contains("INFO  [foo] foo-info")
            && text.contains("INFO  [bar] bar-info")
            && text.contains("INFO  [foo] foo-in-thread")
    });

    pair.parent_context
        .set_log_level("*:TRACE")
        .expect("valid pattern");
    pair.parent_context.notify_profile_change();
    wait_until("child pattern", || {
        pair.child_context.log_level_pattern() == "*:TRACE"
    });
    assert_eq!(foo.level(), LogLevel::Trace);

    foo.trace("foo-trace-yes", &[]);
    wait_until("trace line", || {
        captured_text(&pair).contains("TRACE [foo] foo-trace-yes")
    });
    assert!(!captured_text(&pair).contains("foo-trace-no"));

    pair.parent.stop_loop();
    pair.child.stop_loop();
    parent_workers.join();
    child_workers.join();
}

#[test]
fn lines_and_profiles_flow_over_json() {
    run_scenario(Arc::new(JsonMarshalizer));
}

#[test]
fn lines_and_profiles_flow_over_msgpack() {
    run_scenario(Arc::new(MsgPackMarshalizer));
}

#[test]
fn stopping_parent_ends_child_profile_reader() {
    let pair = pair(Arc::new(JsonMarshalizer));
    let parent_workers = pair
        .parent
        .start_loop(std::io::empty(), std::io::empty())
        .expect("parent loop starts");
    let child_workers = pair.child.start_loop().expect("child loop starts");

    pair.parent.stop_loop();
    wait_until("child profile reader exit", || child_workers.is_finished());

    pair.child.stop_loop();
    parent_workers.join();
    child_workers.join();
}
