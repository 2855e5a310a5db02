//! In-process rasterizer backed by pdfium

use super::{DEFAULT_PAGE_WIDTH, Rasterizer};
use crate::compose::encode_png;
use crate::types::*;
use image::RgbaImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Initialize Pdfium, trying an explicit directory, then the vendored
/// library, then the system library.
pub fn init_pdfium(library_dir: Option<&Path>) -> std::result::Result<Pdfium, PdfiumError> {
    // When running from cargo, the working directory is the workspace root
    let vendor_dir = std::env::current_dir().ok().and_then(|mut p| {
        p.push("vendor/pdfium/lib");
        if p.exists() { Some(p) } else { None }
    });

    for dir in library_dir.map(Path::to_path_buf).into_iter().chain(vendor_dir) {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
        {
            return Ok(Pdfium::new(binding));
        }
        log::debug!("No usable pdfium library in {}", dir.display());
    }

    Pdfium::bind_to_system_library().map(Pdfium::new)
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfiumRasterizer {
    /// Output width in pixels; height follows the page shape
    pub page_width: u32,
    /// Directory holding the pdfium shared library
    pub library_dir: Option<PathBuf>,
}

impl Default for PdfiumRasterizer {
    fn default() -> Self {
        Self {
            page_width: DEFAULT_PAGE_WIDTH,
            library_dir: None,
        }
    }
}

impl PdfiumRasterizer {
    fn render_page(&self, page: &PdfPage<'_>) -> Result<Vec<u8>> {
        let config = PdfRenderConfig::new().set_target_width(self.page_width as i32);
        let bitmap = page.render_with_config(&config)?;
        let width = bitmap.width() as u32;
        let height = bitmap.height() as u32;
        let rgba = bitmap.as_rgba_bytes().to_vec();

        let image = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
            RenderError::Raster(format!(
                "pdfium returned a short buffer for a {}x{} page",
                width, height
            ))
        })?;

        encode_png(&image)
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn rasterize_page(&self, document: &Path, page_index: usize) -> Result<Option<Vec<u8>>> {
        let pdfium = init_pdfium(self.library_dir.as_deref())?;
        let pdf = pdfium.load_pdf_from_file(document, None)?;
        let pages = pdf.pages();

        if page_index >= pages.len() as usize {
            return Ok(None);
        }
        let page = pages.get(page_index as u16)?;
        self.render_page(&page).map(Some)
    }

    /// Bind the library and load the document once for the whole range
    fn rasterize_from(&self, document: &Path, first_page: usize) -> Result<Vec<Vec<u8>>> {
        let pdfium = init_pdfium(self.library_dir.as_deref())?;
        let pdf = pdfium.load_pdf_from_file(document, None)?;
        let pages = pdf.pages();

        (first_page..pages.len() as usize)
            .map(|index| {
                let page = pages.get(index as u16)?;
                self.render_page(&page)
            })
            .collect()
    }
}
