//! Document history sources
//!
//! A [`HistorySource`] lists the states of a document's history in
//! chronological order and can write out the source tree of any of them.

mod git;
mod types;

pub use git::GitHistory;
pub use types::*;

use std::path::Path;

/// Ordered access to the historical states of a document
pub trait HistorySource: Send {
    /// All states, oldest first
    fn states(&self) -> Result<Vec<HistoricalState>>;

    /// Write the source tree of `state` into `dest`
    fn materialize(&self, state: &HistoricalState, dest: &Path) -> Result<()>;
}
