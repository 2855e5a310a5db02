use flatplan_history::{HistoricalState, HistorySource};
use flatplan_layout::{CanvasFit, CanvasSize};
use flatplan_pipeline::*;
use flatplan_render::{DocumentCompiler, Rasterizer, RenderError, decode_page, encode_png};
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// What each fake commit's document contains
#[derive(Clone, Copy)]
enum Doc {
    Pages(usize),
    Broken,
}

/// History whose states each materialize to a single `doc.txt`
struct FakeHistory {
    docs: Vec<Doc>,
}

impl FakeHistory {
    fn new(docs: &[Doc]) -> Self {
        Self {
            docs: docs.to_vec(),
        }
    }
}

impl HistorySource for FakeHistory {
    fn states(&self) -> flatplan_history::Result<Vec<HistoricalState>> {
        Ok((0..self.docs.len())
            .map(|i| HistoricalState::new(format!("{:040x}", i + 1), format!("commit {}", i), i as i64))
            .collect())
    }

    fn materialize(&self, state: &HistoricalState, dest: &Path) -> flatplan_history::Result<()> {
        let index = usize::from_str_radix(&state.id, 16).unwrap() - 1;
        let text = match self.docs[index] {
            Doc::Pages(n) => n.to_string(),
            Doc::Broken => "broken".to_string(),
        };
        std::fs::write(dest.join("doc.txt"), text)?;
        Ok(())
    }
}

/// "Compiles" `doc.txt` by copying its text, failing on broken documents
struct FakeCompiler {
    calls: Arc<AtomicUsize>,
}

impl DocumentCompiler for FakeCompiler {
    fn name(&self) -> &str {
        "fake-latex"
    }

    fn compile(&self, source_root: &Path) -> flatplan_render::Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = std::fs::read_to_string(source_root.join("doc.txt"))?;
        if text == "broken" {
            return Err(RenderError::ToolFailed {
                tool: "fake-latex".to_string(),
                status: "exit status: 12".to_string(),
                output: "! Undefined control sequence.".to_string(),
            });
        }
        Ok(text.into_bytes())
    }
}

/// Renders page `i` as a small image whose red channel encodes `i`
struct FakeRasterizer {
    calls: Arc<AtomicUsize>,
}

impl Rasterizer for FakeRasterizer {
    fn name(&self) -> &str {
        "fake-raster"
    }

    fn rasterize_page(
        &self,
        document: &Path,
        page_index: usize,
    ) -> flatplan_render::Result<Option<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let pages: usize = std::fs::read_to_string(document)?
            .parse()
            .map_err(|_| RenderError::Raster("not a page count".to_string()))?;
        if page_index >= pages {
            return Ok(None);
        }
        let page = RgbaImage::from_pixel(60, 78, Rgba([10 + page_index as u8 * 20, 200, 50, 255]));
        encode_png(&page).map(Some)
    }
}

/// Renders a whole document in one call and records where each call started
struct RangeRasterizer {
    starts: Arc<Mutex<Vec<usize>>>,
}

impl Rasterizer for RangeRasterizer {
    fn name(&self) -> &str {
        "range-raster"
    }

    fn rasterize_page(&self, _: &Path, _: usize) -> flatplan_render::Result<Option<Vec<u8>>> {
        Err(RenderError::Raster("pages are only rendered in ranges".to_string()))
    }

    fn rasterize_from(
        &self,
        document: &Path,
        first_page: usize,
    ) -> flatplan_render::Result<Vec<Vec<u8>>> {
        self.starts.lock().unwrap().push(first_page);
        let pages: usize = std::fs::read_to_string(document)?
            .parse()
            .map_err(|_| RenderError::Raster("not a page count".to_string()))?;
        (first_page..pages)
            .map(|index| encode_png(&RgbaImage::from_pixel(60, 78, Rgba([index as u8, 0, 0, 255]))))
            .collect()
    }
}

struct Harness {
    compiles: Arc<AtomicUsize>,
    rasterizations: Arc<AtomicUsize>,
    store: Arc<MemoryStore>,
    output: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            compiles: Arc::new(AtomicUsize::new(0)),
            rasterizations: Arc::new(AtomicUsize::new(0)),
            store: Arc::new(MemoryStore::new()),
            output: TempDir::new().unwrap(),
        }
    }

    fn options(&self, failure_policy: FailurePolicy) -> PipelineOptions {
        PipelineOptions {
            canvas: CanvasSize::new(640, 360),
            failure_policy,
            output_dir: self.output.path().to_path_buf(),
            ..Default::default()
        }
    }

    fn pipeline(
        &self,
        docs: &[Doc],
        failure_policy: FailurePolicy,
    ) -> Pipeline<FakeHistory, Arc<MemoryStore>> {
        self.pipeline_with(docs, self.options(failure_policy))
    }

    fn pipeline_with(
        &self,
        docs: &[Doc],
        options: PipelineOptions,
    ) -> Pipeline<FakeHistory, Arc<MemoryStore>> {
        Pipeline::new(
            FakeHistory::new(docs),
            Box::new(FakeCompiler {
                calls: self.compiles.clone(),
            }),
            Box::new(FakeRasterizer {
                calls: self.rasterizations.clone(),
            }),
            self.store.clone(),
            options,
        )
    }

    /// Render `docs` with `configure` applied, returning the first flatplan
    fn render(&self, docs: &[Doc], configure: impl Fn(&mut PipelineOptions)) -> Vec<u8> {
        let mut options = self.options(FailurePolicy::Abort);
        configure(&mut options);
        let summary = self.pipeline_with(docs, options).run_blocking().unwrap();
        std::fs::read(&summary.outputs[0]).unwrap()
    }

    fn outputs(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.output.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[test]
fn test_shared_layout_from_largest_state() {
    let harness = Harness::new();
    let summary = harness
        .pipeline(&[Doc::Pages(2), Doc::Pages(0), Doc::Pages(7), Doc::Pages(3)], FailurePolicy::Abort)
        .run_blocking()
        .unwrap();

    assert_eq!(summary.states, 4);
    assert_eq!(summary.max_pages, 7);
    assert_eq!(summary.layout.page_count(), 7);
    assert_eq!(summary.rendered.len(), 3);
    assert_eq!(summary.empty.len(), 1);
    assert_eq!(summary.empty[0].summary, "commit 1");
    assert!(summary.skipped.is_empty());

    // Empty states get no output and no number
    assert_eq!(
        harness.outputs(),
        vec!["flatplan-0000.png", "flatplan-0001.png", "flatplan-0002.png"]
    );
    assert_eq!(summary.rendered[1].summary, "commit 2");

    // Every output has the same dimensions
    for path in &summary.outputs {
        let image = decode_page(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(
            (image.width(), image.height()),
            (summary.layout.canvas.width, summary.layout.canvas.height)
        );
    }
}

#[test]
fn test_short_state_leaves_cells_blank() {
    let harness = Harness::new();
    let summary = harness
        .pipeline(&[Doc::Pages(2), Doc::Pages(6)], FailurePolicy::Abort)
        .run_blocking()
        .unwrap();

    let layout = &summary.layout;
    let first = decode_page(&std::fs::read(&summary.outputs[0]).unwrap())
        .unwrap()
        .to_rgba8();

    for (index, placement) in layout.placements.iter().enumerate() {
        let pixel = *first.get_pixel(
            placement.x + layout.cell.width / 2,
            placement.y + layout.cell.height / 2,
        );
        if index < 2 {
            assert_eq!(pixel.0[1], 200, "cell {} should hold a page", index);
        } else {
            assert_eq!(pixel, Rgba([0, 0, 0, 255]), "cell {} should be blank", index);
        }
    }
}

#[test]
fn test_second_run_hits_cache() {
    let harness = Harness::new();
    let docs = [Doc::Pages(3), Doc::Pages(4)];

    harness
        .pipeline(&docs, FailurePolicy::Abort)
        .run_blocking()
        .unwrap();
    assert_eq!(harness.compiles.load(Ordering::SeqCst), 2);
    // One extra call per state discovers the end of the document
    assert_eq!(harness.rasterizations.load(Ordering::SeqCst), 3 + 1 + 4 + 1);
    let first_outputs = harness.outputs();

    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    harness
        .pipeline(&docs, FailurePolicy::Abort)
        .with_updates(update_tx)
        .run_blocking()
        .unwrap();

    assert_eq!(harness.compiles.load(Ordering::SeqCst), 2);
    assert_eq!(harness.rasterizations.load(Ordering::SeqCst), 9);
    assert_eq!(harness.outputs(), first_outputs);

    let mut rasterized = 0;
    let mut composited = 0;
    while let Ok(update) = update_rx.try_recv() {
        match update {
            PipelineUpdate::StateRasterized { cached, .. } => {
                assert!(cached);
                rasterized += 1;
            }
            PipelineUpdate::StateComposited { cached, .. } => {
                assert!(cached);
                composited += 1;
            }
            _ => {}
        }
    }
    assert_eq!((rasterized, composited), (2, 2));
}

#[test]
fn test_cached_document_survives_lost_pages() {
    let harness = Harness::new();
    let docs = [Doc::Pages(2)];
    harness
        .pipeline(&docs, FailurePolicy::Abort)
        .run_blocking()
        .unwrap();

    // Only the document stage is left in a fresh store
    let fresh = Arc::new(MemoryStore::new());
    let state_id = format!("{:040x}", 1);
    let document = ArtifactKey::document(&state_id);
    fresh
        .write(&document, &harness.store.read(&document).unwrap().unwrap())
        .unwrap();

    let rerun = Harness {
        store: fresh.clone(),
        ..Harness::new()
    };
    rerun
        .pipeline(&docs, FailurePolicy::Abort)
        .run_blocking()
        .unwrap();

    assert_eq!(rerun.compiles.load(Ordering::SeqCst), 0);
    assert_eq!(rerun.rasterizations.load(Ordering::SeqCst), 3);
    assert!(fresh.contains(&ArtifactKey::manifest(&state_id)).unwrap());
}

#[test]
fn test_background_change_rebuilds_flatplan() {
    let docs = [Doc::Pages(3)];
    let white = |options: &mut PipelineOptions| options.background = [255, 255, 255, 255];

    let harness = Harness::new();
    harness.render(&docs, |_| {});
    let rerun = harness.render(&docs, white);
    let fresh = Harness::new().render(&docs, white);

    assert_eq!(rerun, fresh);
    let image = decode_page(&rerun).unwrap().to_rgba8();
    assert_eq!(*image.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    // Pages were reused, only the composite was rebuilt
    assert_eq!(harness.rasterizations.load(Ordering::SeqCst), 4);
}

#[test]
fn test_gutter_change_rebuilds_flatplan() {
    let docs = [Doc::Pages(3)];
    let preserve = |gutter: u32| {
        move |options: &mut PipelineOptions| {
            options.layout.canvas_fit = CanvasFit::Preserve;
            options.layout.gutter = gutter;
        }
    };

    // Both gutters give a 3x1 grid on the full canvas, only the cells differ
    let harness = Harness::new();
    let narrow = harness.render(&docs, preserve(20));
    let rerun = harness.render(&docs, preserve(60));
    let fresh = Harness::new().render(&docs, preserve(60));

    assert_ne!(narrow, rerun);
    assert_eq!(rerun, fresh);
}

#[test]
fn test_stale_flatplans_are_removed() {
    let harness = Harness::new();
    std::fs::write(harness.output.path().join("flatplan-0009.png"), b"old").unwrap();
    std::fs::write(harness.output.path().join("notes.txt"), b"keep me").unwrap();

    harness
        .pipeline(&[Doc::Pages(1), Doc::Pages(2)], FailurePolicy::Abort)
        .run_blocking()
        .unwrap();

    assert_eq!(
        harness.outputs(),
        vec!["flatplan-0000.png", "flatplan-0001.png", "notes.txt"]
    );
}

#[test]
fn test_each_state_rasterized_in_one_call() {
    let harness = Harness::new();
    let starts = Arc::new(Mutex::new(Vec::new()));

    // An interrupted run left the first page of the second state behind
    let second = format!("{:040x}", 2);
    let leftover = encode_png(&RgbaImage::from_pixel(60, 78, Rgba([0, 0, 0, 255]))).unwrap();
    harness
        .store
        .write(&ArtifactKey::page(&second, 0), &leftover)
        .unwrap();

    let pipeline = Pipeline::new(
        FakeHistory::new(&[Doc::Pages(3), Doc::Pages(4)]),
        Box::new(FakeCompiler {
            calls: harness.compiles.clone(),
        }),
        Box::new(RangeRasterizer {
            starts: starts.clone(),
        }),
        harness.store.clone(),
        harness.options(FailurePolicy::Abort),
    );
    let summary = pipeline.run_blocking().unwrap();

    assert_eq!(*starts.lock().unwrap(), vec![0, 1]);
    assert_eq!(summary.max_pages, 4);
    let manifest = pipeline.cache().read_manifest(&second).unwrap().unwrap();
    assert_eq!(
        manifest,
        PageManifest {
            page_count: 4,
            page_width: 60,
            page_height: 78,
        }
    );
    assert!(harness.store.contains(&ArtifactKey::page(&second, 3)).unwrap());
}

#[test]
fn test_abort_on_tool_failure() {
    let harness = Harness::new();
    let result = harness
        .pipeline(&[Doc::Pages(2), Doc::Broken, Doc::Pages(3)], FailurePolicy::Abort)
        .run_blocking();

    match result {
        Err(PipelineError::Render(RenderError::ToolFailed { tool, .. })) => {
            assert_eq!(tool, "fake-latex");
        }
        other => panic!("Expected ToolFailed, got {:?}", other.map(|s| s.outputs)),
    }
    // Nothing is composited before the census is complete
    assert!(harness.outputs().is_empty());
    assert_eq!(harness.compiles.load(Ordering::SeqCst), 2);
}

#[test]
fn test_skip_on_tool_failure() {
    let harness = Harness::new();
    let summary = harness
        .pipeline(&[Doc::Pages(2), Doc::Broken, Doc::Pages(3)], FailurePolicy::Skip)
        .run_blocking()
        .unwrap();

    assert_eq!(summary.rendered.len(), 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].0.summary, "commit 1");
    assert!(summary.skipped[0].1.contains("Undefined control sequence"));
    assert_eq!(summary.max_pages, 3);
    assert_eq!(harness.outputs().len(), 2);
}

#[test]
fn test_no_pages_anywhere() {
    let harness = Harness::new();
    let result = harness
        .pipeline(&[Doc::Pages(0), Doc::Pages(0)], FailurePolicy::Abort)
        .run_blocking();
    assert!(matches!(result, Err(PipelineError::NoPages)));

    let result = Harness::new()
        .pipeline(&[Doc::Broken], FailurePolicy::Skip)
        .run_blocking();
    assert!(matches!(result, Err(PipelineError::NoPages)));
}

#[test]
fn test_invalid_canvas_fails_before_work() {
    let harness = Harness::new();
    let mut options = harness.options(FailurePolicy::Abort);
    options.canvas = CanvasSize::new(30, 30);

    let pipeline = Pipeline::new(
        FakeHistory::new(&[Doc::Pages(1)]),
        Box::new(FakeCompiler {
            calls: harness.compiles.clone(),
        }),
        Box::new(FakeRasterizer {
            calls: harness.rasterizations.clone(),
        }),
        MemoryStore::new(),
        options,
    );

    assert!(matches!(pipeline.run_blocking(), Err(PipelineError::Layout(_))));
    assert_eq!(harness.compiles.load(Ordering::SeqCst), 0);
}

#[test]
fn test_updates_respect_pass_barrier() {
    let harness = Harness::new();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    harness
        .pipeline(&[Doc::Pages(1), Doc::Pages(5), Doc::Pages(2)], FailurePolicy::Abort)
        .with_updates(update_tx)
        .run_blocking()
        .unwrap();

    let mut updates = Vec::new();
    while let Ok(update) = update_rx.try_recv() {
        updates.push(update);
    }

    let position = |pred: &dyn Fn(&PipelineUpdate) -> bool| -> Vec<usize> {
        updates
            .iter()
            .enumerate()
            .filter(|(_, u)| pred(u))
            .map(|(i, _)| i)
            .collect()
    };
    let rasterized = position(&|u| matches!(u, PipelineUpdate::StateRasterized { .. }));
    let layout = position(&|u| matches!(u, PipelineUpdate::LayoutChosen { .. }));
    let composited = position(&|u| matches!(u, PipelineUpdate::StateComposited { .. }));

    assert!(matches!(updates.first(), Some(PipelineUpdate::Started { states: 3 })));
    assert!(matches!(
        updates.last(),
        Some(PipelineUpdate::Finished {
            rendered: 3,
            skipped: 0
        })
    ));
    assert_eq!(rasterized.len(), 3);
    assert_eq!(layout.len(), 1);
    assert_eq!(composited.len(), 3);
    assert!(rasterized.iter().all(|&i| i < layout[0]));
    assert!(composited.iter().all(|&i| i > layout[0]));
}

#[tokio::test]
async fn test_async_run() {
    let harness = Harness::new();
    let summary = harness
        .pipeline(&[Doc::Pages(4)], FailurePolicy::Abort)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.outputs.len(), 1);
    assert!(summary.outputs[0].ends_with("flatplan-0000.png"));
    // Narrow pages on a wide canvas sit in a single row
    assert_eq!((summary.layout.grid.columns, summary.layout.grid.rows), (4, 1));
}

#[tokio::test]
async fn test_survey_writes_no_flatplans() {
    let harness = Harness::new();
    let (census, layout) = harness
        .pipeline(&[Doc::Pages(3), Doc::Broken, Doc::Pages(5)], FailurePolicy::Skip)
        .survey()
        .await
        .unwrap();

    assert_eq!(census.len(), 3);
    assert_eq!(census.max_pages(), 5);
    assert_eq!(census.skipped().count(), 1);
    assert_eq!(layout.page_count(), 5);
    assert!(harness.outputs().is_empty());
}
