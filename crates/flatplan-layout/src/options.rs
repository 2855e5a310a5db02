use crate::constants::{DEFAULT_GUTTER, DEFAULT_MIN_MARGIN};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunable spacing and search behaviour for the grid layout
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutOptions {
    /// Outer gutter on every side of the canvas, in pixels
    pub gutter: u32,
    /// Minimum spacing between neighbouring cells, in pixels
    pub min_margin: u32,
    pub grid_search: GridSearch,
    pub canvas_fit: CanvasFit,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            gutter: DEFAULT_GUTTER,
            min_margin: DEFAULT_MIN_MARGIN,
            grid_search: GridSearch::Heuristic,
            canvas_fit: CanvasFit::Shrink,
        }
    }
}

impl LayoutOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options = serde_json::from_slice(&bytes)
            .map_err(|e| LayoutError::Config(format!("Failed to parse layout options: {}", e)))?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            LayoutError::Config(format!("Failed to serialize layout options: {}", e))
        })?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options against a canvas.
    ///
    /// The gutters alone must leave at least one pixel in each direction.
    pub fn validate(&self, canvas: CanvasSize) -> Result<()> {
        if canvas.width == 0 || canvas.height == 0 {
            return Err(LayoutError::InvalidLayoutInput(format!(
                "canvas must be non-empty, got {}x{}",
                canvas.width, canvas.height
            )));
        }

        let both_gutters = self.gutter as u64 * 2;
        if both_gutters >= canvas.width as u64 || both_gutters >= canvas.height as u64 {
            return Err(LayoutError::InvalidLayoutInput(format!(
                "gutter of {}px leaves no room on a {}x{} canvas",
                self.gutter, canvas.width, canvas.height
            )));
        }

        Ok(())
    }
}
