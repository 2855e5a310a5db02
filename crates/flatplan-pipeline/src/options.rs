use crate::types::*;
use flatplan_layout::{CanvasSize, LayoutOptions};
use flatplan_render::{DEFAULT_BACKGROUND, LatexCompiler, RasterSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything a pipeline run needs besides the history itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub canvas: CanvasSize,
    /// RGBA fill for gutters, margins and blank cells
    pub background: [u8; 4],
    pub layout: LayoutOptions,
    pub compiler: LatexCompiler,
    pub raster: RasterSettings,
    pub failure_policy: FailurePolicy,
    /// Where the numbered flatplans are written
    pub output_dir: PathBuf,
    /// Artifact cache root; the caller picks one when unset
    pub cache_dir: Option<PathBuf>,
    /// Newest commit of the walked history
    pub revision: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            background: DEFAULT_BACKGROUND.0,
            layout: LayoutOptions::default(),
            compiler: LatexCompiler::default(),
            raster: RasterSettings::default(),
            failure_policy: FailurePolicy::default(),
            output_dir: PathBuf::from("flatplan-output"),
            cache_dir: None,
            revision: "HEAD".to_string(),
        }
    }
}

impl PipelineOptions {
    /// Load options from JSON file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::Config(format!("Failed to parse options: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize options: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.layout.validate(self.canvas)?;

        if self.compiler.program.trim().is_empty() {
            return Err(PipelineError::Config("compiler program is empty".to_string()));
        }
        if self.compiler.document.as_os_str().is_empty() {
            return Err(PipelineError::Config("document path is empty".to_string()));
        }
        if self.raster.page_width == 0 {
            return Err(PipelineError::Config(
                "page width must be at least 1 pixel".to_string(),
            ));
        }
        if self.revision.trim().is_empty() {
            return Err(PipelineError::Config("revision is empty".to_string()));
        }

        Ok(())
    }
}
