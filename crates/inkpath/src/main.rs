//! inkpath: turn a line drawing into a pen-plotter G-code program.
//!
//! Reads an image, binarizes it, traces and simplifies the outlines of
//! its shapes and writes them as G-code. Optionally attaches object
//! labels from a precomputed detection file to an SVG preview, and lets
//! the operator tune the simplification tolerance interactively.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin inkpath -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout)]

mod interactive;
mod output;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use image::DynamicImage;
use inkpath_export::{ExportError, GcodeParams, SvgMetadata};
use inkpath_pipeline::binarize::{self, BinaryMask};
use inkpath_pipeline::contour::{self, ExtractParams};
use inkpath_pipeline::{
    Detection, ExtractionReport, MatcherKind, OutlineLabel, PipelineConfig, PipelineError,
    Polyline, StaticDetections, Tuner,
};
use tracing_subscriber::EnvFilter;

/// Convert a raster line drawing into G-code for a pen plotter.
///
/// Dark strokes on a light page become closed outlines; each outline is
/// drawn once with the pen down and the program ends at the origin.
#[derive(Parser)]
#[command(name = "inkpath", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Where to write the program. The extension is forced to `.gcode`.
    /// Defaults to the input path with a `.gcode` extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Luma values strictly above this become foreground.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Minimum enclosed area, in square pixels, for an outline to be kept.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MIN_AREA)]
    min_area: f64,

    /// Keep outlines whose bounding rectangle touches the image border.
    #[arg(long)]
    keep_border: bool,

    /// Distance from the edge, in pixels, that counts as touching.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_BORDER_MARGIN)]
    border_margin: u32,

    /// Simplification tolerance in pixels (0 disables simplification).
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Feed rate for drawing moves, in mm/min.
    #[arg(long, default_value_t = GcodeParams::DEFAULT_FEED_RATE)]
    feed_rate: f64,

    /// Servo value with the pen on the paper.
    #[arg(long, default_value_t = GcodeParams::DEFAULT_PEN_DOWN)]
    pen_down: f64,

    /// Servo value with the pen lifted.
    #[arg(long, default_value_t = GcodeParams::DEFAULT_PEN_UP)]
    pen_up: f64,

    /// Dwell after each pen change, in milliseconds.
    #[arg(long, default_value_t = GcodeParams::DEFAULT_WAIT_MS)]
    wait_ms: u32,

    /// JSON file holding an array of detections to label outlines with.
    #[arg(long)]
    detections: Option<PathBuf>,

    /// Detections scoring below this are ignored.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_MIN_CONFIDENCE)]
    min_confidence: f64,

    /// Minimum overlap (intersection over union) for a label to attach.
    #[arg(long, default_value_t = PipelineConfig::DEFAULT_IOU_THRESHOLD)]
    iou_threshold: f64,

    /// How detections are assigned to outlines.
    #[arg(long, value_enum, default_value_t = Matcher::Greedy)]
    matcher: Matcher,

    /// Write an SVG preview of the outlines (and labels) to this file.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Tune the tolerance from stdin before writing the program.
    ///
    /// The preview is rewritten after every step. Enter `+` or `-` to
    /// adjust, an empty line to accept, `q` to quit without writing.
    #[arg(long)]
    interactive: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Print the extraction report as JSON instead of a table.
    #[arg(long)]
    report_json: bool,
}

/// Matcher selection.
#[derive(Clone, Copy, ValueEnum)]
enum Matcher {
    /// Each outline takes its best detection; detections may repeat.
    Greedy,
    /// Each detection labels at most one outline.
    OneToOne,
}

/// Everything that can stop a run.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The input or detection file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// An output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// `--config-json` did not parse.
    #[error("error parsing --config-json: {0}")]
    ConfigJson(#[source] serde_json::Error),

    /// The detection file did not parse.
    #[error("invalid detections in {}: {source}", path.display())]
    Detections {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// The extraction report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Report(#[source] serde_json::Error),

    /// Reading commands or writing prompts failed during tuning.
    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),

    /// Pipeline failure.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Export failure.
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(CliError::ConfigJson);
    }

    Ok(PipelineConfig {
        threshold: cli.threshold,
        min_area: cli.min_area,
        ignore_border: !cli.keep_border,
        border_margin: cli.border_margin,
        tolerance: cli.tolerance,
        iou_threshold: cli.iou_threshold,
        min_confidence: cli.min_confidence,
        matcher: match cli.matcher {
            Matcher::Greedy => MatcherKind::Greedy,
            Matcher::OneToOne => MatcherKind::OneToOne,
        },
    })
}

const fn gcode_params_from_cli(cli: &Cli) -> GcodeParams {
    GcodeParams {
        feed_rate: cli.feed_rate,
        pen_down: cli.pen_down,
        pen_up: cli.pen_up,
        wait_ms: cli.wait_ms,
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_detections(path: &Path) -> Result<Vec<Detection>, CliError> {
    let bytes = read_file(path)?;
    serde_json::from_slice(&bytes).map_err(|source| CliError::Detections {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolution and channel count of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ImageInfo {
    width: u32,
    height: u32,
    channels: u8,
}

impl ImageInfo {
    fn of(image: &DynamicImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            channels: image.color().channel_count(),
        }
    }
}

/// Render the extraction report as a table, or as pretty JSON.
fn render_report(report: &ExtractionReport, json: bool) -> Result<String, CliError> {
    if json {
        serde_json::to_string_pretty(report).map_err(CliError::Report)
    } else {
        Ok(report.report())
    }
}

/// Default preview location used by `--interactive` when `--preview` is
/// not given.
fn interactive_preview_path(input: &Path) -> PathBuf {
    input.with_extension("preview.svg")
}

fn write_preview(
    path: &Path,
    outlines: &[Polyline],
    labels: Option<&[Option<OutlineLabel>]>,
    mask: &BinaryMask,
    title: &str,
    tolerance: f64,
) -> Result<(), CliError> {
    let description = format!("tolerance={tolerance:.2}");
    let metadata = SvgMetadata {
        title: Some(title),
        description: Some(&description),
    };
    let svg = inkpath_export::to_preview_svg(outlines, labels, mask.dimensions(), &metadata);
    output::write_text(path, &svg)?;
    tracing::debug!(path = %path.display(), bytes = svg.len(), "preview written");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;
    config.validate()?;
    let gcode_params = gcode_params_from_cli(cli);
    gcode_params.validate()?;

    let bytes = read_file(&cli.image_path)?;
    tracing::info!(
        image = %cli.image_path.display(),
        bytes = bytes.len(),
        "read input"
    );
    let image = binarize::decode(&bytes)?;
    let info = ImageInfo::of(&image);
    tracing::info!(
        width = info.width,
        height = info.height,
        channels = info.channels,
        "decoded image"
    );
    let mask = binarize::binarize(&image, config.threshold)?;
    let params = ExtractParams::from(&config);

    let title = cli
        .image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("inkpath");

    let (tolerance, outlines) = if cli.interactive {
        let preview = cli
            .preview
            .clone()
            .unwrap_or_else(|| interactive_preview_path(&cli.image_path));
        tracing::info!(preview = %preview.display(), "interactive tuning started");
        let mut tuner = Tuner::new(&mask, params);
        let stdin = io::stdin().lock();
        let mut stderr = io::stderr().lock();
        let chosen = interactive::run(&mut tuner, stdin, &mut stderr, |tolerance, outlines| {
            write_preview(&preview, outlines, None, &mask, title, tolerance)
        })?;
        let Some(chosen) = chosen else {
            tracing::info!("tuning cancelled; no program written");
            return Ok(());
        };
        // The tuner's report describes the last recomputation, which is
        // the accepted tolerance.
        println!("{}", render_report(tuner.report(), cli.report_json)?);
        chosen
    } else {
        let (outlines, report) = contour::extract_with_report(&mask, &params);
        println!("{}", render_report(&report, cli.report_json)?);
        (params.tolerance, outlines)
    };

    if outlines.is_empty() {
        tracing::info!("no contours found; no program written");
        return Ok(());
    }

    let labels = match cli.detections {
        Some(ref path) => {
            let detector = StaticDetections::new(load_detections(path)?, config.min_confidence);
            let labels = inkpath_pipeline::label_outlines(&image, &outlines, &detector, &config)?;
            for (i, label) in labels.iter().enumerate() {
                if let Some(label) = label {
                    tracing::info!(
                        outline = i + 1,
                        label = %label.label,
                        confidence = label.confidence,
                        "outline labelled"
                    );
                }
            }
            Some(labels)
        }
        None => None,
    };

    if let Some(ref path) = cli.preview {
        write_preview(
            path,
            &outlines,
            labels.as_deref(),
            &mask,
            title,
            tolerance,
        )?;
        tracing::info!(path = %path.display(), "preview written");
    }

    let gcode = inkpath_export::to_gcode(&outlines, &gcode_params);
    let requested = cli
        .output
        .clone()
        .unwrap_or_else(|| output::default_output_path(&cli.image_path));
    let written = output::save_gcode(&gcode, &requested)?;
    tracing::info!(
        path = %written.display(),
        outlines = outlines.len(),
        tolerance,
        "program written"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
