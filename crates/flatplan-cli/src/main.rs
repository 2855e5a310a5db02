mod logger;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flatplan_history::GitHistory;
use flatplan_layout::{CanvasFit, CanvasSize, GridSearch, calculate_statistics};
use flatplan_pipeline::{FailurePolicy, FsStore, Pipeline, PipelineOptions, PipelineUpdate};
use flatplan_render::{RasterBackend, parse_color};
use logger::CliLogger;
use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "flatplan",
    about = "Render a flatplan of a LaTeX document for every commit in its history",
    version
)]
struct Cli {
    /// Git repository holding the document
    repo: PathBuf,

    /// Directory for the numbered flatplans [default: flatplan-output]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Artifact cache directory [default: <REPO>/.flatplan-cache]
    #[arg(long)]
    cache: Option<PathBuf>,

    /// Main document, relative to the repository root [default: main.tex]
    #[arg(long)]
    document: Option<PathBuf>,

    /// Newest commit to include [default: HEAD]
    #[arg(long)]
    rev: Option<String>,

    /// Canvas width in pixels [default: 1920]
    #[arg(long)]
    width: Option<u32>,

    /// Canvas height in pixels [default: 1080]
    #[arg(long)]
    height: Option<u32>,

    /// Outer gutter in pixels [default: 20]
    #[arg(long)]
    gutter: Option<u32>,

    /// Minimum spacing between pages in pixels [default: 10]
    #[arg(long)]
    margin: Option<u32>,

    /// Background colour as #rrggbb or #rrggbbaa [default: #000000]
    #[arg(long, value_parser = parse_background)]
    background: Option<[u8; 4]>,

    /// How the grid shape is chosen
    #[arg(long, value_enum)]
    grid_search: Option<GridSearchArg>,

    /// What happens to unused canvas space
    #[arg(long, value_enum)]
    canvas_fit: Option<CanvasFitArg>,

    /// Page rasterizer
    #[arg(long, value_enum)]
    rasterizer: Option<RasterizerArg>,

    /// Skip commits whose document fails to build instead of stopping
    #[arg(long)]
    keep_going: bool,

    /// Load options from a JSON file; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the effective options to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Show layout statistics only, don't write flatplans
    #[arg(long)]
    stats_only: bool,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum GridSearchArg {
    Heuristic,
    LocalSearch,
}

#[derive(Clone, Copy, ValueEnum)]
enum CanvasFitArg {
    Shrink,
    Preserve,
}

#[derive(Clone, Copy, ValueEnum)]
enum RasterizerArg {
    Pdfium,
    Convert,
}

impl From<GridSearchArg> for GridSearch {
    fn from(arg: GridSearchArg) -> Self {
        match arg {
            GridSearchArg::Heuristic => Self::Heuristic,
            GridSearchArg::LocalSearch => Self::LocalSearch,
        }
    }
}

impl From<CanvasFitArg> for CanvasFit {
    fn from(arg: CanvasFitArg) -> Self {
        match arg {
            CanvasFitArg::Shrink => Self::Shrink,
            CanvasFitArg::Preserve => Self::Preserve,
        }
    }
}

impl From<RasterizerArg> for RasterBackend {
    fn from(arg: RasterizerArg) -> Self {
        match arg {
            RasterizerArg::Pdfium => Self::Pdfium,
            RasterizerArg::Convert => Self::Convert,
        }
    }
}

fn parse_background(text: &str) -> std::result::Result<[u8; 4], String> {
    parse_color(text)
        .map(|color| color.0)
        .ok_or_else(|| format!("expected #rrggbb or #rrggbbaa, got '{}'", text))
}

impl Cli {
    /// Apply command-line flags on top of loaded or default options
    fn apply(&self, options: &mut PipelineOptions) {
        if let Some(output) = &self.output {
            options.output_dir = output.clone();
        }
        if let Some(cache) = &self.cache {
            options.cache_dir = Some(cache.clone());
        }
        if let Some(document) = &self.document {
            options.compiler.document = document.clone();
        }
        if let Some(rev) = &self.rev {
            options.revision = rev.clone();
        }
        options.canvas = CanvasSize::new(
            self.width.unwrap_or(options.canvas.width),
            self.height.unwrap_or(options.canvas.height),
        );
        if let Some(gutter) = self.gutter {
            options.layout.gutter = gutter;
        }
        if let Some(margin) = self.margin {
            options.layout.min_margin = margin;
        }
        if let Some(background) = self.background {
            options.background = background;
        }
        if let Some(grid_search) = self.grid_search {
            options.layout.grid_search = grid_search.into();
        }
        if let Some(canvas_fit) = self.canvas_fit {
            options.layout.canvas_fit = canvas_fit.into();
        }
        if let Some(rasterizer) = self.rasterizer {
            options.raster.backend = rasterizer.into();
        }
        if self.keep_going {
            options.failure_policy = FailurePolicy::Skip;
        }
    }
}

fn report(update: &PipelineUpdate) {
    match update {
        PipelineUpdate::Started { states } => log::debug!("Walking {} commits", states),
        PipelineUpdate::Progress {
            operation,
            current,
            total,
        } => log::debug!("[{}/{}] {}", current, total, operation),
        PipelineUpdate::StateRasterized {
            state,
            page_count,
            cached,
        } => log::info!(
            "{} {:>3} pages{}  {}",
            state.short_id,
            page_count,
            if *cached { " (cached)" } else { "" },
            state.summary
        ),
        PipelineUpdate::StateSkipped { state, reason } => {
            log::debug!("{} skipped: {}", state.short_id, reason)
        }
        PipelineUpdate::LayoutChosen {
            max_pages,
            columns,
            rows,
            width,
            height,
        } => log::debug!(
            "Layout for {} pages: {}x{} grid, {}x{} canvas",
            max_pages,
            columns,
            rows,
            width,
            height
        ),
        PipelineUpdate::StateComposited { state, path, cached } => log::debug!(
            "{} -> {}{}",
            state.short_id,
            path.display(),
            if *cached { " (cached)" } else { "" }
        ),
        PipelineUpdate::Finished { rendered, skipped } => {
            log::debug!("Finished: {} rendered, {} skipped", rendered, skipped)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    CliLogger::new(cli.verbose).init()?;

    let mut options = match &cli.config {
        Some(path) => PipelineOptions::load(path)
            .await
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => PipelineOptions::default(),
    };
    cli.apply(&mut options);
    options.validate()?;

    if let Some(path) = &cli.save_config {
        options.save(path).await?;
        println!("Saved options → {}", path.display());
    }

    let cache_dir = options
        .cache_dir
        .clone()
        .unwrap_or_else(|| cli.repo.join(".flatplan-cache"));
    let history = GitHistory::open(&cli.repo, options.revision.clone())
        .with_context(|| format!("Failed to open repository at {}", cli.repo.display()))?;
    let rasterizer = options.raster.build()?;
    let compiler = Box::new(options.compiler.clone());
    let output_dir = options.output_dir.clone();
    log::debug!("Caching artifacts in {}", cache_dir.display());

    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let reporter = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            report(&update);
        }
    });

    let pipeline = Pipeline::new(
        history,
        compiler,
        rasterizer,
        FsStore::new(cache_dir),
        options,
    )
    .with_updates(update_tx);

    if cli.stats_only {
        let (census, layout) = pipeline.survey().await?;
        reporter.await?;

        let stats = calculate_statistics(&layout);
        println!("Flatplan Statistics:");
        println!("  Commits: {}", census.len());
        println!("  With pages: {}", census.rendered().count());
        println!("  Without pages: {}", census.empty().count());
        println!("  Skipped: {}", census.skipped().count());
        println!("  Pages per flatplan: {}", stats.page_count);
        println!("  Grid: {}x{}", layout.grid.columns, layout.grid.rows);
        println!("  Cell: {}x{}", layout.cell.width, layout.cell.height);
        println!(
            "  Canvas: {}x{} (requested {}x{})",
            stats.canvas.width,
            stats.canvas.height,
            stats.requested_canvas.width,
            stats.requested_canvas.height
        );
        println!("  Blank cells: {}", stats.blank_slots);
        println!("  Coverage: {:.1}%", stats.coverage * 100.0);
        return Ok(());
    }

    let summary = pipeline.run().await?;
    reporter.await?;

    for (state, reason) in &summary.skipped {
        println!("Skipped {} ({}): {}", state.short_id, state.summary, reason);
    }
    println!(
        "Rendered {} of {} commits → {}",
        summary.outputs.len(),
        summary.states,
        output_dir.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_options() {
        let cli = Cli::parse_from([
            "flatplan",
            "thesis",
            "--width",
            "3840",
            "--margin",
            "4",
            "--grid-search",
            "local-search",
            "--rasterizer",
            "convert",
            "--background",
            "#ffffff",
            "--keep-going",
        ]);
        let mut options = PipelineOptions::default();
        cli.apply(&mut options);

        assert_eq!(options.canvas, CanvasSize::new(3840, 1080));
        assert_eq!(options.layout.min_margin, 4);
        assert_eq!(options.layout.gutter, 20);
        assert_eq!(options.layout.grid_search, GridSearch::LocalSearch);
        assert_eq!(options.raster.backend, RasterBackend::Convert);
        assert_eq!(options.background, [255, 255, 255, 255]);
        assert_eq!(options.failure_policy, FailurePolicy::Skip);
        assert_eq!(options.revision, "HEAD");
    }

    #[test]
    fn test_missing_flags_keep_loaded_options() {
        let cli = Cli::parse_from(["flatplan", "thesis"]);
        let mut options = PipelineOptions {
            revision: "draft".to_string(),
            failure_policy: FailurePolicy::Skip,
            ..Default::default()
        };
        options.layout.canvas_fit = CanvasFit::Preserve;
        let expected = options.clone();

        cli.apply(&mut options);
        assert_eq!(options, expected);
    }

    #[test]
    fn test_background_parser() {
        assert_eq!(parse_background("#102030"), Ok([16, 32, 48, 255]));
        assert!(parse_background("black").is_err());
    }
}
