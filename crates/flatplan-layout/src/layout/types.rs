//! Layout data types for flatplans
//!
//! These types carry the result of a layout run from the grid engine to
//! the compositor. None of them is stored; all are derived from a page
//! count, a page aspect ratio and a canvas.

use crate::types::CanvasSize;

/// Position within the grid (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPosition {
    /// Row index (0 = top row)
    pub row: usize,
    /// Column index (0 = leftmost column)
    pub col: usize,
}

impl GridPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Grid dimensions for a flatplan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSpec {
    /// Number of columns in the page grid
    pub columns: usize,
    /// Number of rows in the page grid
    pub rows: usize,
}

impl GridSpec {
    /// Smallest grid holding `page_count` pages with at most `columns` columns.
    ///
    /// Rows come from the column count, then columns are tightened to the
    /// row count, so neither a row nor a column is ever left fully empty.
    pub fn fitting(page_count: usize, columns: usize) -> Self {
        let columns = columns.clamp(1, page_count.max(1));
        let rows = page_count.div_ceil(columns).max(1);
        let columns = page_count.div_ceil(rows).max(1);
        Self { columns, rows }
    }

    /// Total number of cells in the grid
    pub fn slot_count(&self) -> usize {
        self.columns * self.rows
    }

    /// Row-major position of a page index
    pub fn position_of(&self, index: usize) -> GridPosition {
        GridPosition::new(index / self.columns, index % self.columns)
    }

    /// Cells left blank when `page_count` pages are placed
    pub fn blank_slots(&self, page_count: usize) -> usize {
        self.slot_count().saturating_sub(page_count)
    }
}

/// Uniform size of every page cell, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl CellSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Outer gutters and inter-cell margins
///
/// Together with the cells these account for every pixel of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GutterSet {
    pub left: u32,
    pub right: u32,
    pub top: u32,
    pub bottom: u32,
    /// Spacing between horizontally adjacent cells
    pub horizontal_margin: u32,
    /// Spacing between vertically adjacent cells
    pub vertical_margin: u32,
}

/// An axis-aligned pixel rectangle, origin at the top-left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Top-left placement of one page on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Page index in document order
    pub page_index: usize,
    /// Cell the page occupies
    pub position: GridPosition,
    pub x: u32,
    pub y: u32,
}

/// Complete result of a layout run
#[derive(Debug, Clone, PartialEq)]
pub struct FlatplanLayout {
    pub grid: GridSpec,
    pub cell: CellSize,
    pub gutters: GutterSet,
    /// One placement per page, in document order
    pub placements: Vec<Placement>,
    /// Canvas to composite onto. Differs from `requested_canvas` when the
    /// layout shrank it to fit the grid exactly.
    pub canvas: CanvasSize,
    pub requested_canvas: CanvasSize,
    /// Page aspect ratio the layout was computed for
    pub page_aspect_ratio: f64,
}

impl FlatplanLayout {
    /// Number of pages the layout was computed for
    pub fn page_count(&self) -> usize {
        self.placements.len()
    }

    /// Canvas width rebuilt from gutters, cells and margins
    pub fn reconstructed_width(&self) -> u32 {
        let cols = self.grid.columns as u32;
        self.gutters.left
            + cols * self.cell.width
            + (cols - 1) * self.gutters.horizontal_margin
            + self.gutters.right
    }

    /// Canvas height rebuilt from gutters, cells and margins
    pub fn reconstructed_height(&self) -> u32 {
        let rows = self.grid.rows as u32;
        self.gutters.top
            + rows * self.cell.height
            + (rows - 1) * self.gutters.vertical_margin
            + self.gutters.bottom
    }

    /// Rectangle covered by the cell of page `index`
    pub fn cell_rect(&self, index: usize) -> Option<Rect> {
        self.placements
            .get(index)
            .map(|p| Rect::new(p.x, p.y, self.cell.width, self.cell.height))
    }

    /// Rectangle of the cell at a grid position, whether or not a page fills it
    pub fn slot_rect(&self, pos: GridPosition) -> Rect {
        let x = self.gutters.left
            + pos.col as u32 * (self.cell.width + self.gutters.horizontal_margin);
        let y = self.gutters.top + pos.row as u32 * (self.cell.height + self.gutters.vertical_margin);
        Rect::new(x, y, self.cell.width, self.cell.height)
    }

    /// Identifier covering every input to the pixel geometry: grid, canvas,
    /// cell, the four gutters and both margins, e.g.
    /// `4x2-1662x1080-398x515-g20.20.20.20-m10.10`
    pub fn fingerprint(&self) -> String {
        let g = &self.gutters;
        format!(
            "{}x{}-{}x{}-{}x{}-g{}.{}.{}.{}-m{}.{}",
            self.grid.columns,
            self.grid.rows,
            self.canvas.width,
            self.canvas.height,
            self.cell.width,
            self.cell.height,
            g.left,
            g.right,
            g.top,
            g.bottom,
            g.horizontal_margin,
            g.vertical_margin
        )
    }
}
