//! Shared helpers for running external tools

use crate::types::*;
use std::process::{Command, Output};

/// Lines of tool output kept in a failure report
const OUTPUT_TAIL_LINES: usize = 20;

/// Run a command to completion, capturing its output.
///
/// A missing executable maps to [`RenderError::ToolNotFound`]; a non-zero
/// exit status is left for the caller to interpret.
pub(crate) fn run_tool(command: &mut Command, tool: &str) -> Result<Output> {
    log::debug!("Running {:?}", command);
    command.output().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RenderError::ToolNotFound {
            tool: tool.to_string(),
        },
        _ => RenderError::Io(e),
    })
}

/// Build a [`RenderError::ToolFailed`] from a finished command
pub(crate) fn tool_failed(tool: &str, output: &Output) -> RenderError {
    RenderError::ToolFailed {
        tool: tool.to_string(),
        status: output.status.to_string(),
        output: output_tail(output),
    }
}

/// Last lines of stdout followed by stderr.
///
/// LaTeX reports most errors on stdout, ImageMagick on stderr.
pub(crate) fn output_tail(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stdout.lines().chain(stderr.lines()).collect();
    let start = lines.len().saturating_sub(OUTPUT_TAIL_LINES);
    lines[start..].join("\n")
}
