//! Shared constants for flatplan layout
//!
//! Default canvas, gutter and margin sizes used when no configuration
//! overrides them.

// =============================================================================
// Canvas
// =============================================================================

/// Default canvas width in pixels (1080p)
pub const DEFAULT_CANVAS_WIDTH: u32 = 1920;

/// Default canvas height in pixels (1080p)
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1080;

// =============================================================================
// Spacing
// =============================================================================

/// Outer gutter between the canvas edge and the nearest cell (pixels)
pub const DEFAULT_GUTTER: u32 = 20;

/// Minimum spacing between adjacent cells (pixels)
pub const DEFAULT_MIN_MARGIN: u32 = 10;

// =============================================================================
// Page Shapes
// =============================================================================

/// Aspect ratio (width / height) of a US Letter portrait page
pub const LETTER_ASPECT_RATIO: f64 = 8.5 / 11.0;
