pub mod constants;
pub mod layout;
mod options;
mod stats;
mod types;

pub use layout::{
    CellSize, FlatplanLayout, GridPosition, GridSpec, GutterSet, Placement, Rect, compute_layout,
};
pub use options::*;
pub use stats::calculate_statistics;
pub use types::*;
