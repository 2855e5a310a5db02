//! Two-pass flatplan pipeline
//!
//! Pass 1 walks the history oldest first, materializing, compiling and
//! rasterizing each state into the artifact cache and recording its page
//! count in a [`PageCensus`]. Once every state is counted, one layout is
//! computed for the largest page count. Pass 2 composites each state's
//! cached pages with that layout and writes the numbered outputs.

use crate::cache::{ArtifactCache, ArtifactKey, ArtifactStore, PageManifest};
use crate::census::{PageCensus, StateOutcome};
use crate::options::PipelineOptions;
use crate::types::*;
use crate::update::PipelineUpdate;
use flatplan_history::{HistoricalState, HistorySource};
use flatplan_layout::FlatplanLayout;
use flatplan_render::{DocumentCompiler, Rasterizer, compose_flatplan, decode_page, encode_png};
use image::Rgba;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

pub struct Pipeline<H, S> {
    history: H,
    compiler: Box<dyn DocumentCompiler>,
    rasterizer: Box<dyn Rasterizer>,
    cache: ArtifactCache<S>,
    options: PipelineOptions,
    updates: Option<mpsc::UnboundedSender<PipelineUpdate>>,
}

impl<H: HistorySource, S: ArtifactStore> Pipeline<H, S> {
    pub fn new(
        history: H,
        compiler: Box<dyn DocumentCompiler>,
        rasterizer: Box<dyn Rasterizer>,
        store: S,
        options: PipelineOptions,
    ) -> Self {
        Self {
            history,
            compiler,
            rasterizer,
            cache: ArtifactCache::new(store),
            options,
            updates: None,
        }
    }

    /// Report progress on `update_tx` while running
    pub fn with_updates(mut self, update_tx: mpsc::UnboundedSender<PipelineUpdate>) -> Self {
        self.updates = Some(update_tx);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn cache(&self) -> &ArtifactCache<S> {
        &self.cache
    }

    fn send(&self, update: PipelineUpdate) {
        if let Some(update_tx) = &self.updates {
            // A dropped receiver only means nobody is listening
            let _ = update_tx.send(update);
        }
    }

    /// Run both passes to completion on the current thread
    pub fn run_blocking(&self) -> Result<RunSummary> {
        let (census, layout) = self.survey_blocking()?;
        let written = self.composite(&census, &layout)?;

        let (rendered, outputs): (Vec<_>, Vec<_>) = written.into_iter().unzip();
        let skipped: Vec<_> = census
            .skipped()
            .map(|(state, reason)| (state.clone(), reason.to_string()))
            .collect();

        self.send(PipelineUpdate::Finished {
            rendered: rendered.len(),
            skipped: skipped.len(),
        });
        log::info!(
            "Wrote {} flatplans to {}",
            outputs.len(),
            self.options.output_dir.display()
        );

        Ok(RunSummary {
            states: census.len(),
            rendered,
            empty: census.empty().cloned().collect(),
            skipped,
            max_pages: census.max_pages(),
            layout,
            outputs,
        })
    }

    /// Pass 1 and the shared layout, without compositing anything
    pub fn survey_blocking(&self) -> Result<(PageCensus, FlatplanLayout)> {
        self.options.validate()?;

        let states = self.history.states()?;
        log::info!("Found {} historical states", states.len());
        self.send(PipelineUpdate::Started {
            states: states.len(),
        });

        let census = self.gather(&states)?;
        let layout = self.plan(&census)?;
        Ok((census, layout))
    }

    /// Pass 1: rasterize every state into the cache and count its pages
    pub fn gather(&self, states: &[HistoricalState]) -> Result<PageCensus> {
        let mut census = PageCensus::new();

        for (index, state) in states.iter().enumerate() {
            self.send(PipelineUpdate::Progress {
                operation: format!("Rasterizing {}", state.short_id),
                current: index + 1,
                total: states.len(),
            });

            match self.rasterize_state(state) {
                Ok((manifest, cached)) => {
                    log::debug!(
                        "{} has {} pages{}",
                        state.short_id,
                        manifest.page_count,
                        if cached { " (cached)" } else { "" }
                    );
                    self.send(PipelineUpdate::StateRasterized {
                        state: state.clone(),
                        page_count: manifest.page_count,
                        cached,
                    });
                    census.record(state.clone(), StateOutcome::Rasterized(manifest));
                }
                Err(e)
                    if e.is_state_failure() && self.options.failure_policy == FailurePolicy::Skip =>
                {
                    log::warn!("Skipping {} ({}): {}", state.short_id, state.summary, e);
                    self.send(PipelineUpdate::StateSkipped {
                        state: state.clone(),
                        reason: e.to_string(),
                    });
                    census.record(state.clone(), StateOutcome::Skipped(e.to_string()));
                }
                Err(e) => {
                    log::error!("Failed on {} ({}): {}", state.short_id, state.summary, e);
                    return Err(e);
                }
            }
        }

        Ok(census)
    }

    /// Compute the layout shared by every flatplan of the run
    pub fn plan(&self, census: &PageCensus) -> Result<FlatplanLayout> {
        let layout = census.layout(self.options.canvas, &self.options.layout)?;
        log::info!(
            "{} pages at most; {}x{} grid on a {}x{} canvas",
            census.max_pages(),
            layout.grid.columns,
            layout.grid.rows,
            layout.canvas.width,
            layout.canvas.height
        );
        self.send(PipelineUpdate::LayoutChosen {
            max_pages: census.max_pages(),
            columns: layout.grid.columns,
            rows: layout.grid.rows,
            width: layout.canvas.width,
            height: layout.canvas.height,
        });
        Ok(layout)
    }

    /// Pass 2: composite every state that has pages.
    ///
    /// Outputs are numbered from zero in history order, counting only
    /// states that produced pages.
    pub fn composite(
        &self,
        census: &PageCensus,
        layout: &FlatplanLayout,
    ) -> Result<Vec<(HistoricalState, PathBuf)>> {
        std::fs::create_dir_all(&self.options.output_dir)?;
        remove_stale_outputs(&self.options.output_dir)?;
        let fingerprint = layout.fingerprint();
        let total = census.rendered().count();

        let mut written = Vec::with_capacity(total);
        for (index, (state, manifest)) in census.rendered().enumerate() {
            self.send(PipelineUpdate::Progress {
                operation: format!("Compositing {}", state.short_id),
                current: index + 1,
                total,
            });

            let key = ArtifactKey::composite(&state.id, &fingerprint, self.options.background);
            let (png, cached) = self
                .cache
                .get_or_insert_with(&key, || self.compose_state(state, manifest, layout))?;

            let path = self.options.output_dir.join(output_name(index));
            std::fs::write(&path, png)?;

            self.send(PipelineUpdate::StateComposited {
                state: state.clone(),
                path: path.clone(),
                cached,
            });
            written.push((state.clone(), path));
        }

        Ok(written)
    }

    /// Rasterize one state, returning its manifest and whether it was
    /// already complete in the cache
    fn rasterize_state(&self, state: &HistoricalState) -> Result<(PageManifest, bool)> {
        if let Some(manifest) = self.cache.read_manifest(&state.id)? {
            return Ok((manifest, true));
        }

        let (pdf, _) = self
            .cache
            .get_or_insert_with(&ArtifactKey::document(&state.id), || self.compile_state(state))?;

        // Rasterizers read from a path, so the cached bytes go back on disk
        let scratch = tempfile::tempdir()?;
        let document = scratch.path().join("document.pdf");
        std::fs::write(&document, &pdf)?;

        let manifest = self.rasterize_pages(state, &document)?;
        self.cache.write_manifest(&state.id, &manifest)?;
        Ok((manifest, false))
    }

    fn compile_state(&self, state: &HistoricalState) -> Result<Vec<u8>> {
        let source = tempfile::tempdir()?;
        self.history.materialize(state, source.path())?;
        log::info!(
            "Compiling {} ({}) with {}",
            state.short_id,
            state.summary,
            self.compiler.name()
        );
        Ok(self.compiler.compile(source.path())?)
    }

    /// Render pages until the rasterizer reports the end, reusing any
    /// pages a previous interrupted run left in the cache
    fn rasterize_pages(&self, state: &HistoricalState, document: &Path) -> Result<PageManifest> {
        let mut page_count = 0;
        let mut first_page = None;

        while let Some(png) = self.cache.read(&ArtifactKey::page(&state.id, page_count))? {
            first_page.get_or_insert(png);
            page_count += 1;
        }
        if page_count > 0 {
            log::debug!("Resuming {} at page {}", state.short_id, page_count);
        }

        for png in self.rasterizer.rasterize_from(document, page_count)? {
            self.cache
                .write(&ArtifactKey::page(&state.id, page_count), &png)?;
            first_page.get_or_insert(png);
            page_count += 1;
        }

        let (page_width, page_height) = match first_page {
            Some(png) => {
                let first = decode_page(&png)?;
                (first.width(), first.height())
            }
            None => (0, 0),
        };

        Ok(PageManifest {
            page_count,
            page_width,
            page_height,
        })
    }

    fn compose_state(
        &self,
        state: &HistoricalState,
        manifest: &PageManifest,
        layout: &FlatplanLayout,
    ) -> Result<Vec<u8>> {
        let pages = (0..manifest.page_count)
            .map(|index| {
                let png = self
                    .cache
                    .read(&ArtifactKey::page(&state.id, index))?
                    .ok_or_else(|| {
                        PipelineError::Cache(format!(
                            "page {} of {} is missing from the cache",
                            index, state.short_id
                        ))
                    })?;
                Ok(decode_page(&png)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let canvas = compose_flatplan(layout, &pages, Rgba(self.options.background))?;
        Ok(encode_png(&canvas)?)
    }
}

impl<H, S> Pipeline<H, S>
where
    H: HistorySource + 'static,
    S: ArtifactStore + 'static,
{
    /// Run both passes on the blocking thread pool
    pub async fn run(self) -> Result<RunSummary> {
        tokio::task::spawn_blocking(move || self.run_blocking()).await?
    }

    /// Gather the census and layout on the blocking thread pool
    pub async fn survey(self) -> Result<(PageCensus, FlatplanLayout)> {
        tokio::task::spawn_blocking(move || self.survey_blocking()).await?
    }
}

/// File name of the `index`-th flatplan in the output directory
pub fn output_name(index: usize) -> String {
    format!("flatplan-{:04}.png", index)
}

/// Whether `name` is a numbered flatplan written by [`output_name`]
fn is_output_name(name: &str) -> bool {
    name.strip_prefix("flatplan-")
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|digits| digits.len() >= 4 && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Delete flatplans left by an earlier run so a shorter series does not
/// keep frames from a longer one. Other files are left alone.
fn remove_stale_outputs(dir: &Path) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_str().is_some_and(is_output_name) && entry.file_type()?.is_file() {
            log::debug!("Removing stale {}", entry.path().display());
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
