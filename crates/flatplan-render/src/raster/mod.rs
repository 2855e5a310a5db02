//! Page rasterization
//!
//! A [`Rasterizer`] renders one page of a compiled document to PNG bytes.
//! Asking for a page past the end is not an error; it returns `None`,
//! which is how callers learn the page count.

mod convert;
#[cfg(all(feature = "pdfium", not(target_arch = "wasm32")))]
mod pdfium;

pub use convert::ConvertRasterizer;
#[cfg(all(feature = "pdfium", not(target_arch = "wasm32")))]
pub use pdfium::{PdfiumRasterizer, init_pdfium};

use crate::types::*;
use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default rendered page width in pixels
pub const DEFAULT_PAGE_WIDTH: u32 = 600;

/// Default ImageMagick sampling density (dpi)
pub const DEFAULT_DENSITY: u32 = 150;

/// Renders single pages of a paginated document
pub trait Rasterizer: Send + Sync {
    /// Short name used in logs and error messages
    fn name(&self) -> &str;

    /// Render page `page_index` of `document` to PNG bytes.
    ///
    /// Returns `Ok(None)` when the document has no such page.
    fn rasterize_page(&self, document: &Path, page_index: usize) -> Result<Option<Vec<u8>>>;

    /// Render every page from `first_page` to the end of `document`.
    ///
    /// The default asks for one page at a time until `rasterize_page`
    /// returns `None`. Backends that can keep a document open override it.
    fn rasterize_from(&self, document: &Path, first_page: usize) -> Result<Vec<Vec<u8>>> {
        let mut pages = Vec::new();
        while let Some(png) = self.rasterize_page(document, first_page + pages.len())? {
            pages.push(png);
        }
        Ok(pages)
    }
}

/// Render every page of `document`, in order, until the rasterizer runs
/// out of pages.
pub fn rasterize_document<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    document: &Path,
) -> Result<Vec<Vec<u8>>> {
    let pages = rasterizer.rasterize_from(document, 0)?;
    log::debug!(
        "{} rendered {} pages from {}",
        rasterizer.name(),
        pages.len(),
        document.display()
    );
    Ok(pages)
}

/// Which rasterizer implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RasterBackend {
    /// In-process rendering through the pdfium library
    Pdfium,
    /// ImageMagick `convert`, one process per page
    Convert,
}

impl Default for RasterBackend {
    fn default() -> Self {
        if cfg!(all(feature = "pdfium", not(target_arch = "wasm32"))) {
            RasterBackend::Pdfium
        } else {
            RasterBackend::Convert
        }
    }
}

/// Rasterizer configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RasterSettings {
    pub backend: RasterBackend,
    /// Rendered page width in pixels; height follows the page shape
    pub page_width: u32,
    /// Sampling density for the `convert` backend
    pub density: u32,
    /// Executable for the `convert` backend
    pub convert_program: String,
    /// Directory holding the pdfium shared library
    pub pdfium_library_dir: Option<PathBuf>,
}

impl Default for RasterSettings {
    fn default() -> Self {
        Self {
            backend: RasterBackend::default(),
            page_width: DEFAULT_PAGE_WIDTH,
            density: DEFAULT_DENSITY,
            convert_program: "convert".to_string(),
            pdfium_library_dir: None,
        }
    }
}

impl RasterSettings {
    /// Build the configured rasterizer
    pub fn build(&self) -> Result<Box<dyn Rasterizer>> {
        match self.backend {
            RasterBackend::Convert => Ok(Box::new(ConvertRasterizer {
                program: self.convert_program.clone(),
                density: self.density,
                page_width: self.page_width,
            })),
            #[cfg(all(feature = "pdfium", not(target_arch = "wasm32")))]
            RasterBackend::Pdfium => Ok(Box::new(PdfiumRasterizer {
                page_width: self.page_width,
                library_dir: self.pdfium_library_dir.clone(),
            })),
            #[cfg(not(all(feature = "pdfium", not(target_arch = "wasm32"))))]
            RasterBackend::Pdfium => Err(RenderError::Raster(
                "built without the pdfium feature".to_string(),
            )),
        }
    }
}
