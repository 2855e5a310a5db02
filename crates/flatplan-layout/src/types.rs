use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Invalid layout input: {0}")]
    InvalidLayoutInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Output canvas dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width divided by height
    pub fn aspect_ratio(self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: crate::constants::DEFAULT_CANVAS_WIDTH,
            height: crate::constants::DEFAULT_CANVAS_HEIGHT,
        }
    }
}

/// How the grid shape is chosen for a page count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridSearch {
    /// Closed-form estimate from the canvas/page skew factor
    #[default]
    Heuristic,
    /// Also try one column fewer and one column more than the estimate,
    /// keeping the shape with the fewest blank cells
    LocalSearch,
}

/// What happens to the canvas once the cell size is known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CanvasFit {
    /// Shrink the canvas so gutters, margins and cells fill it exactly
    #[default]
    Shrink,
    /// Keep the requested canvas and centre the grid by widening the outer gutters
    Preserve,
}

/// Statistics about a flatplan layout
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutStatistics {
    /// Number of pages the layout was computed for
    pub page_count: usize,
    /// Total cells in the grid
    pub slot_count: usize,
    /// Cells that stay background-filled at full page count
    pub blank_slots: usize,
    /// Pages occupying the final row
    pub last_row_filled: usize,
    /// Fraction of the canvas covered by page cells (0.0 - 1.0)
    pub coverage: f64,
    /// Final canvas size
    pub canvas: CanvasSize,
    /// Canvas size that was asked for
    pub requested_canvas: CanvasSize,
}
