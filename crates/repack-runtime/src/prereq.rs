use crate::config::ToolConfig;
use crate::host::{APEXER, DEBUGFS};
use std::fmt;
use std::path::Path;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: String,
    pub purpose: &'static str,
    pub install_hint: String,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn program_available(program: &Path) -> bool {
    if program.components().count() > 1 {
        program.is_file()
    } else {
        command_exists(&program.to_string_lossy())
    }
}

/// Check that every external tool the host toolchain needs is in place.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_host_tools(config: &ToolConfig) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    for (tool, purpose) in [
        (DEBUGFS, "dumping the payload filesystem image"),
        (APEXER, "rebuilding the container"),
    ] {
        let path = config.tool(tool);
        if !path.is_file() {
            missing.push(MissingPrereq {
                name: path.display().to_string(),
                purpose,
                install_hint: format!("m {tool}, or point --tools-dir at the host tools bin/"),
            });
        }
    }

    let jar = config.signapk_jar();
    if !jar.is_file() {
        missing.push(MissingPrereq {
            name: jar.display().to_string(),
            purpose: "signing the container",
            install_hint: "m signapk".to_owned(),
        });
    }

    let java = config.java();
    if !program_available(&java) {
        missing.push(MissingPrereq {
            name: java.display().to_string(),
            purpose: "running signapk.jar",
            install_hint: "install a JDK or pass --java".to_owned(),
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nThe repack tool drives these host tools to rebuild and re-sign the container.");
    msg
}
