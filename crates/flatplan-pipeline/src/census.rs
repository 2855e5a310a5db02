//! Page census
//!
//! Pass 1 records what every historical state produced. The census is the
//! barrier between the passes: the shared layout is sized from its maximum
//! and nothing is composited until it is complete.

use crate::cache::PageManifest;
use crate::types::*;
use flatplan_history::HistoricalState;
use flatplan_layout::{CanvasSize, FlatplanLayout, LayoutOptions, compute_layout};

/// What pass 1 produced for one state
#[derive(Debug, Clone, PartialEq)]
pub enum StateOutcome {
    /// Every page was rasterized (possibly zero of them)
    Rasterized(PageManifest),
    /// An external tool failed and the state was left out
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CensusEntry {
    pub state: HistoricalState,
    pub outcome: StateOutcome,
}

impl CensusEntry {
    /// Pages this state contributes; skipped states contribute none
    pub fn page_count(&self) -> usize {
        match &self.outcome {
            StateOutcome::Rasterized(manifest) => manifest.page_count,
            StateOutcome::Skipped(_) => 0,
        }
    }
}

/// Page counts of every state, oldest first
#[derive(Debug, Clone, Default)]
pub struct PageCensus {
    entries: Vec<CensusEntry>,
}

impl PageCensus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, state: HistoricalState, outcome: StateOutcome) {
        self.entries.push(CensusEntry { state, outcome });
    }

    pub fn entries(&self) -> &[CensusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Largest page count of any state
    pub fn max_pages(&self) -> usize {
        self.entries
            .iter()
            .map(CensusEntry::page_count)
            .max()
            .unwrap_or(0)
    }

    /// Page shape taken from the first state reaching the maximum page count
    pub fn page_aspect_ratio(&self) -> Option<f64> {
        let max = self.max_pages();
        self.entries.iter().find_map(|entry| match &entry.outcome {
            StateOutcome::Rasterized(manifest) if max > 0 && manifest.page_count == max => {
                manifest.aspect_ratio()
            }
            _ => None,
        })
    }

    /// States with at least one page, with their manifests
    pub fn rendered(&self) -> impl Iterator<Item = (&HistoricalState, &PageManifest)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            StateOutcome::Rasterized(manifest) if manifest.page_count > 0 => {
                Some((&entry.state, manifest))
            }
            _ => None,
        })
    }

    /// States that compiled but produced no pages
    pub fn empty(&self) -> impl Iterator<Item = &HistoricalState> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            StateOutcome::Rasterized(manifest) if manifest.page_count == 0 => Some(&entry.state),
            _ => None,
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&HistoricalState, &str)> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            StateOutcome::Skipped(reason) => Some((&entry.state, reason.as_str())),
            _ => None,
        })
    }

    /// The one layout every flatplan of the series shares
    pub fn layout(&self, canvas: CanvasSize, options: &LayoutOptions) -> Result<FlatplanLayout> {
        let max_pages = self.max_pages();
        let aspect_ratio = match self.page_aspect_ratio() {
            Some(ratio) if max_pages > 0 => ratio,
            _ => return Err(PipelineError::NoPages),
        };
        Ok(compute_layout(max_pages, aspect_ratio, canvas, options)?)
    }
}
