pub mod repack;

use indicatif::{ProgressBar, ProgressStyle};
use repack_core::CoreError;
use repack_runtime::RuntimeError;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_TOOL_ERROR: u8 = 2;
pub const EXIT_ARTIFACT_ERROR: u8 = 3;

/// A failed command: the process exit code and the message for stderr.
#[derive(Debug)]
pub struct CommandError {
    pub code: u8,
    pub message: String,
}

impl CommandError {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<CoreError> for CommandError {
    fn from(err: CoreError) -> Self {
        Self::new(exit_code_for(&err), err.to_string())
    }
}

impl From<RuntimeError> for CommandError {
    fn from(err: RuntimeError) -> Self {
        CoreError::from(err).into()
    }
}

pub fn exit_code_for(err: &CoreError) -> u8 {
    match err {
        CoreError::Runtime(RuntimeError::CommandFailed { .. } | RuntimeError::Spawn { .. }) => {
            EXIT_TOOL_ERROR
        }
        CoreError::Runtime(
            RuntimeError::MissingArtifact(_) | RuntimeError::CorruptContainer { .. },
        )
        | CoreError::Schema(_) => EXIT_ARTIFACT_ERROR,
        _ => EXIT_FAILURE,
    }
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, CommandError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CommandError::new(EXIT_FAILURE, format!("JSON serialization failed: {e}")))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn finish(pb: &ProgressBar, msg: String) {
    if let Ok(style) = ProgressStyle::with_template("{msg}") {
        pb.set_style(style);
    }
    pb.finish_with_message(msg);
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    finish(pb, format!("✗ {msg}"));
}

pub fn colorize_mode(mode: &str) -> String {
    use console::Style;
    match mode {
        "strip" => Style::new().yellow().apply_to(mode).to_string(),
        "sharedlibs" => Style::new().cyan().apply_to(mode).to_string(),
        other => other.to_owned(),
    }
}
