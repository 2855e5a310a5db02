//! Grid layout calculation for flatplans
//!
//! This module handles all the geometric calculations for a flatplan:
//! - Grid shape (columns and rows for a page count)
//! - Cell size (aspect-locked to the page)
//! - Gutters, margins and the final canvas size
//! - Page placement (row-major, top-left origin)

mod cells;
mod grid;
mod placement;
mod types;

pub use cells::*;
pub use grid::*;
pub use placement::*;
pub use types::*;

use crate::options::LayoutOptions;
use crate::types::*;

/// Compute the flatplan layout for `page_count` pages.
///
/// `page_count` should be the largest count across every state rendered
/// with this layout, so each page keeps its cell across the series. The
/// result depends only on the arguments.
///
/// # Arguments
/// * `page_count` - Number of pages to place (at least 1)
/// * `page_aspect_ratio` - Page width divided by page height
/// * `canvas` - Requested canvas size in pixels
/// * `options` - Gutter, margin, grid search and canvas fit settings
pub fn compute_layout(
    page_count: usize,
    page_aspect_ratio: f64,
    canvas: CanvasSize,
    options: &LayoutOptions,
) -> Result<FlatplanLayout> {
    if page_count == 0 {
        return Err(LayoutError::InvalidLayoutInput(
            "page count must be at least 1".to_string(),
        ));
    }
    if !page_aspect_ratio.is_finite() || page_aspect_ratio <= 0.0 {
        return Err(LayoutError::InvalidLayoutInput(format!(
            "page aspect ratio must be positive, got {}",
            page_aspect_ratio
        )));
    }
    options.validate(canvas)?;

    let (grid, cell) = candidate_grids(page_count, page_aspect_ratio, canvas, options.grid_search)
        .into_iter()
        .filter_map(|grid| {
            fit_cell(grid, page_aspect_ratio, canvas, options).map(|cell| (grid, cell))
        })
        // Fewest blank cells first, then the larger cell; earlier candidates win ties
        .reduce(|best, next| {
            let best_blank = best.0.blank_slots(page_count);
            let next_blank = next.0.blank_slots(page_count);
            if next_blank < best_blank
                || (next_blank == best_blank && next.1.area() > best.1.area())
            {
                next
            } else {
                best
            }
        })
        .ok_or_else(|| {
            LayoutError::InvalidLayoutInput(format!(
                "{} pages do not fit on a {}x{} canvas",
                page_count, canvas.width, canvas.height
            ))
        })?;

    let gutters = gutters_for(grid, cell, canvas, options);
    let fitted = match options.canvas_fit {
        CanvasFit::Shrink => fitted_canvas(grid, cell, &gutters),
        CanvasFit::Preserve => canvas,
    };
    let placements = place_pages(page_count, grid, cell, &gutters);

    Ok(FlatplanLayout {
        grid,
        cell,
        gutters,
        placements,
        canvas: fitted,
        requested_canvas: canvas,
        page_aspect_ratio,
    })
}
