use flatplan_history::HistoricalState;
use std::path::PathBuf;

/// Progress reported by a running pipeline
#[derive(Debug, Clone)]
pub enum PipelineUpdate {
    /// The history was walked
    Started {
        states: usize,
    },
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    /// Pass 1 finished a state
    StateRasterized {
        state: HistoricalState,
        page_count: usize,
        /// Every page came from the cache
        cached: bool,
    },
    StateSkipped {
        state: HistoricalState,
        reason: String,
    },
    /// The census is complete and the shared layout is known
    LayoutChosen {
        max_pages: usize,
        columns: usize,
        rows: usize,
        width: u32,
        height: u32,
    },
    /// Pass 2 wrote a flatplan
    StateComposited {
        state: HistoricalState,
        path: PathBuf,
        cached: bool,
    },
    Finished {
        rendered: usize,
        skipped: usize,
    },
}
