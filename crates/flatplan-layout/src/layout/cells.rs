//! Cell sizing and gutter calculation

use crate::options::LayoutOptions;
use crate::types::{CanvasFit, CanvasSize};

use super::{CellSize, GridSpec, GutterSet};

/// Largest aspect-locked cell that fits every slot of the grid.
///
/// Returns `None` when the canvas leaves less than one pixel per cell
/// after gutters and minimum margins.
pub fn fit_cell(
    grid: GridSpec,
    page_aspect_ratio: f64,
    canvas: CanvasSize,
    options: &LayoutOptions,
) -> Option<CellSize> {
    let cols = grid.columns as i64;
    let rows = grid.rows as i64;
    let gutter = options.gutter as i64;
    let margin = options.min_margin as i64;

    let usable_width = canvas.width as i64 - 2 * gutter - (cols - 1) * margin;
    let usable_height = canvas.height as i64 - 2 * gutter - (rows - 1) * margin;
    if usable_width < cols || usable_height < rows {
        return None;
    }

    let slot_width = usable_width as f64 / cols as f64;
    let slot_height = usable_height as f64 / rows as f64;

    let (width, height) = if slot_width < page_aspect_ratio * slot_height {
        // Width binds
        let width = usable_width / cols;
        let height = (width as f64 / page_aspect_ratio).floor() as i64;
        (width, height)
    } else {
        // Height binds
        let height = usable_height / rows;
        let width = (height as f64 * page_aspect_ratio).floor() as i64;
        (width, height)
    };

    if width < 1 || height < 1 {
        return None;
    }

    Some(CellSize::new(width as u32, height as u32))
}

/// Outer gutters and margins for a fitted grid, computed in one pass.
///
/// With [`CanvasFit::Shrink`] every gutter is the configured width and the
/// canvas is rebuilt around the grid. With [`CanvasFit::Preserve`] the
/// leftover pixels on each axis are split between its two outer gutters,
/// odd pixel going to the trailing side.
pub fn gutters_for(
    grid: GridSpec,
    cell: CellSize,
    canvas: CanvasSize,
    options: &LayoutOptions,
) -> GutterSet {
    let margin = options.min_margin;
    let gutter = options.gutter;

    match options.canvas_fit {
        CanvasFit::Shrink => GutterSet {
            left: gutter,
            right: gutter,
            top: gutter,
            bottom: gutter,
            horizontal_margin: margin,
            vertical_margin: margin,
        },
        CanvasFit::Preserve => {
            let (left, right) = split_residual(canvas.width, grid.columns, cell.width, gutter, margin);
            let (top, bottom) = split_residual(canvas.height, grid.rows, cell.height, gutter, margin);
            GutterSet {
                left,
                right,
                top,
                bottom,
                horizontal_margin: margin,
                vertical_margin: margin,
            }
        }
    }
}

/// Leading and trailing gutter along one axis of a preserved canvas
fn split_residual(extent: u32, count: usize, cell: u32, gutter: u32, margin: u32) -> (u32, u32) {
    let count = count as u32;
    let occupied = 2 * gutter + count * cell + (count - 1) * margin;
    let residual = extent.saturating_sub(occupied);
    let leading = gutter + residual / 2;
    let trailing = gutter + residual - residual / 2;
    (leading, trailing)
}

/// Canvas rebuilt exactly from gutters, cells and margins
pub fn fitted_canvas(grid: GridSpec, cell: CellSize, gutters: &GutterSet) -> CanvasSize {
    let cols = grid.columns as u32;
    let rows = grid.rows as u32;
    CanvasSize::new(
        gutters.left + cols * cell.width + (cols - 1) * gutters.horizontal_margin + gutters.right,
        gutters.top + rows * cell.height + (rows - 1) * gutters.vertical_margin + gutters.bottom,
    )
}
