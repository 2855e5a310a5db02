//! Document compilation
//!
//! Turns a checked-out source tree into PDF bytes by running an external
//! LaTeX toolchain.

use crate::process::{run_tool, tool_failed};
use crate::types::*;
use std::path::{Path, PathBuf};
use std::process::Command;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Something that turns a source tree into a paginated document
pub trait DocumentCompiler: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// Compile the document found under `source_root`, returning PDF bytes
    fn compile(&self, source_root: &Path) -> Result<Vec<u8>>;
}

/// Compiles a LaTeX document with an external driver such as `latexmk`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LatexCompiler {
    /// Executable to run
    pub program: String,
    /// Arguments placed before the document file name
    pub args: Vec<String>,
    /// Main document, relative to the source root
    pub document: PathBuf,
}

impl Default for LatexCompiler {
    fn default() -> Self {
        Self {
            program: "latexmk".to_string(),
            args: vec![
                "-pdf".to_string(),
                "-interaction=nonstopmode".to_string(),
                "-halt-on-error".to_string(),
            ],
            document: PathBuf::from("main.tex"),
        }
    }
}

impl LatexCompiler {
    pub fn new(document: impl Into<PathBuf>) -> Self {
        Self {
            document: document.into(),
            ..Default::default()
        }
    }

    /// Path of the PDF the driver writes next to the source
    pub fn output_path(&self, source_root: &Path) -> PathBuf {
        source_root.join(&self.document).with_extension("pdf")
    }
}

impl DocumentCompiler for LatexCompiler {
    fn name(&self) -> &str {
        &self.program
    }

    fn compile(&self, source_root: &Path) -> Result<Vec<u8>> {
        let source = source_root.join(&self.document);
        if !source.is_file() {
            return Err(RenderError::MissingSource(self.document.clone()));
        }

        // Run from the document's directory so relative \input paths resolve
        let workdir = source.parent().unwrap_or(source_root);
        let file_name = source
            .file_name()
            .ok_or_else(|| RenderError::MissingSource(self.document.clone()))?;

        let output = run_tool(
            Command::new(&self.program)
                .args(&self.args)
                .arg(file_name)
                .current_dir(workdir),
            &self.program,
        )?;
        if !output.status.success() {
            return Err(tool_failed(&self.program, &output));
        }

        let pdf_path = self.output_path(source_root);
        match std::fs::read(&pdf_path) {
            Ok(bytes) => {
                log::debug!("Compiled {} ({} bytes)", pdf_path.display(), bytes.len());
                Ok(bytes)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(RenderError::MissingOutput(pdf_path))
            }
            Err(e) => Err(e.into()),
        }
    }
}
