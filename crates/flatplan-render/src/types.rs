use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("'{tool}' was not found on PATH")]
    ToolNotFound { tool: String },
    #[error("'{tool}' failed with {status}:\n{output}")]
    ToolFailed {
        tool: String,
        status: String,
        output: String,
    },
    #[error("Document source not found: {}", .0.display())]
    MissingSource(PathBuf),
    #[error("Compiler produced no output at {}", .0.display())]
    MissingOutput(PathBuf),
    #[error("{supplied} pages supplied for a layout with {capacity} placements")]
    TooManyPages { supplied: usize, capacity: usize },
    #[error("Rasterizer error: {0}")]
    Raster(String),
    #[cfg(all(feature = "pdfium", not(target_arch = "wasm32")))]
    #[error("Pdfium error: {0}")]
    Pdfium(#[from] pdfium_render::prelude::PdfiumError),
}

pub type Result<T> = std::result::Result<T, RenderError>;
