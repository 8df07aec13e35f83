use clap::ValueEnum;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DiagLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl DiagLevel {
    pub fn as_filter(self) -> tracing::level_filters::LevelFilter {
        match self {
            DiagLevel::Error => tracing::level_filters::LevelFilter::ERROR,
            DiagLevel::Warn => tracing::level_filters::LevelFilter::WARN,
            DiagLevel::Info => tracing::level_filters::LevelFilter::INFO,
            DiagLevel::Debug => tracing::level_filters::LevelFilter::DEBUG,
            DiagLevel::Trace => tracing::level_filters::LevelFilter::TRACE,
        }
    }
}

/// Install the diagnostics subscriber. Diagnostics always go to stderr so
/// they never mix with relayed log output on stdout.
pub fn init_logging(format: LogFormat, level: DiagLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level.as_filter())
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
