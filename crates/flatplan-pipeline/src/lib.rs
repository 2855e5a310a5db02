//! Flatplan history pipeline
//!
//! Ties a [`HistorySource`](flatplan_history::HistorySource), a document
//! compiler and a rasterizer to the grid layout, caching every
//! intermediate artifact per historical state.

pub mod cache;
mod census;
mod options;
mod pipeline;
mod types;
mod update;

pub use cache::{ArtifactCache, ArtifactKey, ArtifactStore, FsStore, MemoryStore, PageManifest, Stage};
pub use census::{CensusEntry, PageCensus, StateOutcome};
pub use options::PipelineOptions;
pub use pipeline::{Pipeline, output_name};
pub use types::*;
pub use update::PipelineUpdate;
