use flatplan_history::{HistoricalState, HistoryError};
use flatplan_layout::{FlatplanLayout, LayoutError};
use flatplan_render::RenderError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("No state in the history produced any pages")]
    NoPages,
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Whether the error belongs to a single historical state (a failed
    /// checkout, compile or rasterization) rather than the whole run
    pub fn is_state_failure(&self) -> bool {
        matches!(self, PipelineError::Render(_) | PipelineError::History(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// What to do when an external tool fails on one state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop the run
    #[default]
    Abort,
    /// Log the failure, leave the state out, carry on
    Skip,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// States found in the history
    pub states: usize,
    /// States written to the output directory, oldest first
    pub rendered: Vec<HistoricalState>,
    /// States that produced no pages
    pub empty: Vec<HistoricalState>,
    /// States whose external tools failed, with the failure message
    pub skipped: Vec<(HistoricalState, String)>,
    /// Largest page count in the census
    pub max_pages: usize,
    /// Layout shared by every output
    pub layout: FlatplanLayout,
    /// Output files, in the same order as `rendered`
    pub outputs: Vec<PathBuf>,
}
