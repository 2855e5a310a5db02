pub mod compile;
pub mod compose;
mod process;
pub mod raster;
mod types;

pub use compile::{DocumentCompiler, LatexCompiler};
pub use compose::{DEFAULT_BACKGROUND, compose_flatplan, decode_page, encode_png, parse_color};
pub use raster::{
    ConvertRasterizer, RasterBackend, RasterSettings, Rasterizer, rasterize_document,
};
#[cfg(all(feature = "pdfium", not(target_arch = "wasm32")))]
pub use raster::{PdfiumRasterizer, init_pdfium};
pub use types::*;
