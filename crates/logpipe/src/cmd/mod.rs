use std::ffi::OsString;
use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use logpipe_logger::{JsonMarshalizer, Marshalizer, MsgPackMarshalizer, DEFAULT_LOG_PATTERN};

use crate::exit::CliResult;

pub mod child_demo;
pub mod run;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a program and relay its shipped log lines and stdout/stderr.
    Run(RunArgs),
    /// Act as a child of `logpipe run`: ship a few log lines and exit.
    ChildDemo(ChildDemoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args),
        Command::ChildDemo(args) => child_demo::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Wire encoding of log lines. Both processes must agree.
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum MarshalizerKind {
    #[default]
    Json,
    Msgpack,
}

impl MarshalizerKind {
    pub fn build(self) -> Arc<dyn Marshalizer> {
        match self {
            MarshalizerKind::Json => Arc::new(JsonMarshalizer),
            MarshalizerKind::Msgpack => Arc::new(MsgPackMarshalizer),
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Name the child's stdout/stderr lines are tagged with. Default: program file name.
    #[arg(long)]
    pub name: Option<String>,
    /// Log level pattern, e.g. "*:INFO,p2p:DEBUG". Pushed to the child on start.
    #[arg(long, env = "LOGPIPE_LOG_PATTERN", default_value = DEFAULT_LOG_PATTERN)]
    pub log_pattern: String,
    /// Show logger names in the console output.
    #[arg(long)]
    pub with_logger_name: bool,
    /// Show correlation elements in the console output.
    #[arg(long)]
    pub with_correlation: bool,
    /// Log line encoding used by the child.
    #[arg(long, value_enum, default_value_t)]
    pub marshalizer: MarshalizerKind,
    /// Program to run.
    #[arg(required = true)]
    pub program: OsString,
    /// Arguments for the program.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<OsString>,
}

#[derive(Args, Debug)]
pub struct ChildDemoArgs {
    /// Log line encoding; must match the parent's.
    #[arg(long, value_enum, default_value_t)]
    pub marshalizer: MarshalizerKind,
    /// How long to wait for the parent to push a "*:TRACE" pattern, in milliseconds.
    #[arg(long, default_value = "5000")]
    pub wait_ms: u64,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
