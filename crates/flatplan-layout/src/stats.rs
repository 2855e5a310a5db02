use crate::layout::FlatplanLayout;
use crate::types::*;

/// Calculate statistics for a flatplan layout
pub fn calculate_statistics(layout: &FlatplanLayout) -> LayoutStatistics {
    let page_count = layout.page_count();
    let slot_count = layout.grid.slot_count();
    let blank_slots = layout.grid.blank_slots(page_count);

    let last_row_filled = match page_count % layout.grid.columns {
        0 => layout.grid.columns.min(page_count),
        partial => partial,
    };

    let page_area = layout.cell.area() * page_count as u64;
    let canvas_area = layout.canvas.area();
    let coverage = if canvas_area == 0 {
        0.0
    } else {
        page_area as f64 / canvas_area as f64
    };

    LayoutStatistics {
        page_count,
        slot_count,
        blank_slots,
        last_row_filled,
        coverage,
        canvas: layout.canvas,
        requested_canvas: layout.requested_canvas,
    }
}
