//! Helpers for invoking external command-line tools.

use std::io;
use std::process::Output;

/// Outcome of running an external tool, before mapping into a module error.
#[derive(Debug)]
pub enum ToolFailure {
    /// The binary could not be found.
    NotFound,
    /// The tool ran and exited unsuccessfully; carries stderr.
    Failed(String),
    /// Spawning or communicating with the tool failed.
    Io(io::Error),
}

/// Extract stdout from a finished command, classifying failures.
pub fn command_stdout(result: io::Result<Output>) -> Result<String, ToolFailure> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let code = output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string());
                Err(ToolFailure::Failed(format!("exit {}: {}", code, stderr)))
            }
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ToolFailure::NotFound),
        Err(e) => Err(ToolFailure::Io(e)),
    }
}

/// Check if a binary is available in PATH.
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}
