use logpipe_frame::FrameConfig;

/// Logger that re-emits the log lines shipped by a child.
pub const LOG_LINES_SINK_NAME: &str = "logLinesSink";
/// Logger that re-emits a child's stdout and stderr lines.
pub const TEXT_OUTPUT_SINK_NAME: &str = "textOutputSink";

/// Configuration of a parent or child part.
#[derive(Debug, Clone)]
pub struct PipesConfig {
    /// Framing limits for both directions.
    pub frame: FrameConfig,
    /// Name of the parent-side logger that receives shipped log lines.
    pub log_lines_sink_name: String,
    /// Name of the parent-side logger that receives stdout/stderr text.
    pub text_output_sink_name: String,
}

impl Default for PipesConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            log_lines_sink_name: LOG_LINES_SINK_NAME.to_string(),
            text_output_sink_name: TEXT_OUTPUT_SINK_NAME.to_string(),
        }
    }
}
