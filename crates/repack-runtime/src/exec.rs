use crate::RuntimeError;
use std::process::{Command, Stdio};
use tracing::debug;

/// Render a command as a single shell-like line for logs and errors.
pub fn display_command(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

/// Run `cmd` to completion and return its combined stdout and stderr.
///
/// A non-zero exit is an error carrying the command line, the exit code
/// and everything the command printed.
pub fn run_and_check_output(cmd: &mut Command) -> Result<String, RuntimeError> {
    let rendered = display_command(cmd);
    debug!("running: {rendered}");

    let output = cmd
        .stdin(Stdio::null())
        .output()
        .map_err(|source| RuntimeError::Spawn {
            program: cmd.get_program().to_string_lossy().into_owned(),
            source,
        })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let trimmed = combined.trim_end();
    if !trimmed.is_empty() {
        debug!("{trimmed}");
    }

    if !output.status.success() {
        return Err(RuntimeError::CommandFailed {
            command: rendered,
            code: output.status.code(),
            output: combined,
        });
    }
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let mut cmd = Command::new("debugfs_static");
        cmd.args(["-R", "rdump ./ /tmp/x", "payload.img"]);
        assert_eq!(
            display_command(&cmd),
            "debugfs_static -R rdump ./ /tmp/x payload.img"
        );
    }

    #[test]
    fn success_returns_combined_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err 1>&2"]);
        let out = run_and_check_output(&mut cmd).unwrap();
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }

    #[test]
    fn failure_carries_code_and_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken image 1>&2; exit 7"]);
        match run_and_check_output(&mut cmd).unwrap_err() {
            RuntimeError::CommandFailed {
                command,
                code,
                output,
            } => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(code, Some(7));
                assert!(output.contains("broken image"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let mut cmd = Command::new("/nonexistent/definitely-not-a-tool");
        let err = run_and_check_output(&mut cmd).unwrap_err();
        assert!(matches!(err, RuntimeError::Spawn { .. }));
    }
}
