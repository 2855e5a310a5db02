//! Page placement within the grid

use super::{CellSize, GridSpec, GutterSet, Placement};

/// Row-major placements for `page_count` pages.
///
/// Page 0 lands top-left; pages fill each row left to right before moving
/// down.
pub fn place_pages(
    page_count: usize,
    grid: GridSpec,
    cell: CellSize,
    gutters: &GutterSet,
) -> Vec<Placement> {
    let step_x = cell.width + gutters.horizontal_margin;
    let step_y = cell.height + gutters.vertical_margin;

    (0..page_count)
        .map(|page_index| {
            let position = grid.position_of(page_index);
            Placement {
                page_index,
                position,
                x: gutters.left + position.col as u32 * step_x,
                y: gutters.top + position.row as u32 * step_y,
            }
        })
        .collect()
}
