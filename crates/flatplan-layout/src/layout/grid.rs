//! Grid shape selection
//!
//! Picks how many columns and rows a flatplan uses for a page count. The
//! default is a closed-form estimate; an optional local search looks one
//! column either side of it.

use crate::types::{CanvasSize, GridSearch};

use super::GridSpec;

// =============================================================================
// Estimation
// =============================================================================

/// Raw column estimate before the grid is tightened.
///
/// A square grid of square cells would want `sqrt(n)` columns. The skew
/// factor `canvas_ratio / page_ratio` stretches that to account for a wide
/// canvas and narrow pages.
pub fn estimate_columns(page_count: usize, page_aspect_ratio: f64, canvas: CanvasSize) -> usize {
    let skew = canvas.aspect_ratio() / page_aspect_ratio;
    let columns = (page_count as f64 * skew).sqrt().ceil();

    // `as` saturates; NaN and tiny values land on zero
    (columns as usize).clamp(1, page_count.max(1))
}

/// Closed-form grid for a page count.
pub fn estimate_grid(page_count: usize, page_aspect_ratio: f64, canvas: CanvasSize) -> GridSpec {
    GridSpec::fitting(
        page_count,
        estimate_columns(page_count, page_aspect_ratio, canvas),
    )
}

// =============================================================================
// Candidates
// =============================================================================

/// Grid shapes worth evaluating, best guess first.
///
/// The heuristic yields a single grid. Local search adds the tightened grids
/// for one column fewer and one column more, dropping duplicates.
pub fn candidate_grids(
    page_count: usize,
    page_aspect_ratio: f64,
    canvas: CanvasSize,
    search: GridSearch,
) -> Vec<GridSpec> {
    let estimate = estimate_columns(page_count, page_aspect_ratio, canvas);
    let mut grids = vec![GridSpec::fitting(page_count, estimate)];

    if search == GridSearch::LocalSearch {
        let neighbours = [estimate.checked_sub(1), Some(estimate + 1)];
        for columns in neighbours.into_iter().flatten() {
            if columns == 0 || columns > page_count {
                continue;
            }
            let grid = GridSpec::fitting(page_count, columns);
            if !grids.contains(&grid) {
                grids.push(grid);
            }
        }
    }

    grids
}
