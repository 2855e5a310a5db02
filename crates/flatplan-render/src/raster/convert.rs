//! ImageMagick rasterizer
//!
//! Renders one page per `convert` invocation and reads the PNG back from
//! stdout. ImageMagick delegates PDF input to Ghostscript, which reports
//! an out-of-range page as an error; that message is the end-of-document
//! signal.

use super::{DEFAULT_DENSITY, DEFAULT_PAGE_WIDTH, Rasterizer};
use crate::process::{run_tool, tool_failed};
use crate::types::*;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Ghostscript messages meaning the requested page does not exist
const PAST_END_MESSAGES: [&str; 2] = [
    "Requested FirstPage is greater than the number of pages in the file",
    "No pages will be processed",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertRasterizer {
    pub program: String,
    /// Sampling density in dpi
    pub density: u32,
    /// Output width in pixels; height follows the page shape
    pub page_width: u32,
}

impl Default for ConvertRasterizer {
    fn default() -> Self {
        Self {
            program: "convert".to_string(),
            density: DEFAULT_DENSITY,
            page_width: DEFAULT_PAGE_WIDTH,
        }
    }
}

impl ConvertRasterizer {
    /// Arguments rendering one page onto white and writing PNG to stdout
    pub fn command_args(&self, document: &Path, page_index: usize) -> Vec<OsString> {
        let mut input = document.as_os_str().to_owned();
        input.push(format!("[{}]", page_index));

        let mut args: Vec<OsString> = vec!["-density".into(), self.density.to_string().into()];
        args.push(input);
        args.extend(
            [
                "-background",
                "white",
                "-alpha",
                "remove",
                "-resize",
                &format!("{}x", self.page_width),
                "-quality",
                "100",
                "-sharpen",
                "0x1.0",
                "png:-",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args
    }

    /// Whether tool output reports a page past the end of the document
    pub fn is_past_end(output: &str) -> bool {
        PAST_END_MESSAGES.iter().any(|m| output.contains(m))
    }
}

impl Rasterizer for ConvertRasterizer {
    fn name(&self) -> &str {
        &self.program
    }

    fn rasterize_page(&self, document: &Path, page_index: usize) -> Result<Option<Vec<u8>>> {
        let output = run_tool(
            Command::new(&self.program).args(self.command_args(document, page_index)),
            &self.program,
        )?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if Self::is_past_end(&stderr) {
                return Ok(None);
            }
            return Err(tool_failed(&self.program, &output));
        }

        if output.stdout.is_empty() {
            return Err(RenderError::Raster(format!(
                "{} wrote no image for page {}",
                self.program, page_index
            )));
        }

        Ok(Some(output.stdout))
    }
}
