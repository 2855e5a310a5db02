//! Flatplan compositing
//!
//! Draws page images into the cells of a [`FlatplanLayout`]. Placement `i`
//! always receives page `i`; cells without a page keep the background.

use crate::types::*;
use flatplan_layout::{CellSize, FlatplanLayout};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Opaque black, the default flatplan background
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Composite `pages` onto a canvas sized by `layout`.
///
/// Fewer pages than placements is normal for states shorter than the
/// longest one in the series. More pages than placements is an error.
pub fn compose_flatplan(
    layout: &FlatplanLayout,
    pages: &[DynamicImage],
    background: Rgba<u8>,
) -> Result<RgbaImage> {
    if pages.len() > layout.placements.len() {
        return Err(RenderError::TooManyPages {
            supplied: pages.len(),
            capacity: layout.placements.len(),
        });
    }

    let mut canvas = RgbaImage::from_pixel(layout.canvas.width, layout.canvas.height, background);
    for (page, placement) in pages.iter().zip(&layout.placements) {
        let cell = fit_to_cell(page, layout.cell);
        imageops::replace(&mut canvas, &cell, placement.x as i64, placement.y as i64);
    }

    Ok(canvas)
}

/// Resample a page to exactly the cell size
fn fit_to_cell(page: &DynamicImage, cell: CellSize) -> RgbaImage {
    if page.width() == cell.width && page.height() == cell.height {
        page.to_rgba8()
    } else {
        imageops::resize(page, cell.width, cell.height, FilterType::Lanczos3)
    }
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Decode a cached page image
pub fn decode_page(bytes: &[u8]) -> Result<DynamicImage> {
    Ok(image::load_from_memory(bytes)?)
}

/// Parse `#rrggbb` or `#rrggbbaa` into a colour
pub fn parse_color(text: &str) -> Option<Rgba<u8>> {
    let hex = text.strip_prefix('#').unwrap_or(text);
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        6 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255])),
        8 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#000000"), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(parse_color("ff8000"), Some(Rgba([255, 128, 0, 255])));
        assert_eq!(parse_color("#ffffff00"), Some(Rgba([255, 255, 255, 0])));
        assert_eq!(parse_color("#fff"), None);
        assert_eq!(parse_color("#gg0000"), None);
    }

    #[test]
    fn test_png_round_trip_dimensions() {
        let image = RgbaImage::from_pixel(7, 3, Rgba([1, 2, 3, 255]));
        let bytes = encode_png(&image).unwrap();
        let decoded = decode_page(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (7, 3));
    }
}
