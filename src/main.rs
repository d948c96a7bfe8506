use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use raster_align::config::RunConfig;
use raster_align::diagnostics::{save_likelihood, AlignStats};
use raster_align::geojson;
use raster_align::surface::io::{load_surface, RasterFormat};
use raster_align::{align_observed, AlignError};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

// Exit codes, one per failure class.
const EXIT_CONFIG: i32 = 2;
const EXIT_MISSING_INPUTS: i32 = 3;
const EXIT_OUTPUT: i32 = 4;
const EXIT_POLYLINE: i32 = 5;
const EXIT_UNKNOWN_FORMAT: i32 = 6;
const EXIT_IMAGE: i32 = 7;
const EXIT_DEBUG_IMAGE: i32 = 16;

#[derive(Parser)]
#[command(
    name = "align",
    version,
    about = "Align a polyline onto the dark pixels of a raster image"
)]
struct Cli {
    /// Background image (PNG or TIFF).
    image: Option<PathBuf>,

    /// LineString file (GeoJSON). Points are image-space pixels: top-left
    /// is (0,0), positive x goes right, negative y goes down.
    linestring: Option<PathBuf>,

    /// Read settings from a JSON file; applied before other flags. May be
    /// given multiple times.
    #[arg(long = "config", value_name = "FILE")]
    config: Vec<PathBuf>,

    /// Open the image as PNG regardless of file extension.
    #[arg(long)]
    png: bool,

    /// Open the image as TIFF regardless of file extension.
    #[arg(long)]
    tiff: bool,

    /// JSON pointer to the LineString feature. Default is the document root.
    #[arg(short, long, value_name = "STRING")]
    pointer: Option<String>,

    /// Write the result to a file rather than standard out.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Replicate the full DOM from the linestring file in the output,
    /// rather than just the feature that was processed.
    #[arg(long)]
    output_full_dom: bool,

    /// Add an arbitrary string to the config object in the output.
    #[arg(short, long, value_name = "TEXT")]
    tag: Option<String>,

    /// Write the per-vertex likelihood debug image to a file.
    #[arg(short, long, value_name = "FILE")]
    debug_image: Option<PathBuf>,

    /// Maximum vertex displacement in pixels.
    #[arg(short = 'm', long, value_name = "PX")]
    max_displace: Option<i32>,

    /// Sigma in pixels for the geometric term.
    #[arg(short = 'k', long, value_name = "PX")]
    kernel_sigma: Option<f64>,

    /// Use only 1 out of every n vertices of the input.
    #[arg(short, long, value_name = "N")]
    stride: Option<usize>,

    /// Place n additional vertices along every input segment (after stride).
    #[arg(long, value_name = "N")]
    subdivide: Option<usize>,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Do not print the effective settings to standard out.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "info" } else { "error" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    if let Err(code) = run(cli) {
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<(), i32> {
    let mut config = RunConfig::default();
    for path in &cli.config {
        config.ingest_file(path).map_err(|e| {
            error!("{e}");
            EXIT_CONFIG
        })?;
    }
    apply_cli(&mut config, &cli);

    // Keep stdout clean when it carries the result itself.
    let mut showed_config = false;
    if config.output.is_some() && !cli.quiet {
        show_config(&config);
        showed_config = true;
    }

    let (Some(image_path), Some(linestring_path)) =
        (config.image.clone(), config.linestring.clone())
    else {
        error!("input image or input linestring not specified; aborting (see --help)");
        if !showed_config {
            show_config(&config);
        }
        return Err(EXIT_MISSING_INPUTS);
    };

    // Resolve Auto from the extension so unknown extensions fail early,
    // instead of letting the decoder guess.
    let format = match config.format {
        RasterFormat::Auto => match image_path.extension().and_then(|e| e.to_str()) {
            Some("png") => RasterFormat::Png,
            Some("tif") | Some("tiff") => RasterFormat::Tiff,
            _ => {
                error!(
                    "did not recognise file extension of {} (.png, .tif, .tiff); \
                     use --png or --tiff to force",
                    image_path.display()
                );
                return Err(EXIT_UNKNOWN_FORMAT);
            }
        },
        forced => forced,
    };

    info!("loading image {}", image_path.display());
    let surface = load_surface(&image_path, format).map_err(|e| {
        error!("{e}");
        EXIT_IMAGE
    })?;

    info!("loading polyline {}", linestring_path.display());
    let input = geojson::load_geojson(
        &linestring_path,
        &config.pointer,
        config.stride,
        config.subdivide,
    )
    .map_err(|e| {
        error!("{e}");
        EXIT_POLYLINE
    })?;
    if input.points.len() < 2 {
        error!(
            "need at least 2 vertices, loaded {}; aborting",
            input.points.len()
        );
        return Err(EXIT_POLYLINE);
    }
    info!("number of vertices: {}", input.points.len());

    // Open the output before doing any work; bail early if we cannot.
    let mut writer: Box<dyn Write> = match &config.output {
        Some(path) => Box::new(BufWriter::new(File::create(path).map_err(|e| {
            error!("cannot open {} for output: {e}; aborting", path.display());
            EXIT_OUTPUT
        })?)),
        None => Box::new(io::stdout()),
    };

    info!("running alignment");
    let progress = ProgressBar::new((input.points.len() - 1) as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} points")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let started = Instant::now();
    let alignment = align_observed(
        &surface,
        &input.points,
        &config.align_params(),
        |_| progress.inc(1),
    )
    .map_err(|e| {
        progress.finish_and_clear();
        error!("{e}");
        match e {
            AlignError::TooFewVertices(_) | AlignError::VertexOutOfBounds { .. } => EXIT_POLYLINE,
            _ => EXIT_CONFIG,
        }
    })?;
    progress.finish_and_clear();

    let runtime = started.elapsed().as_secs_f64();
    let per_point = runtime / (input.points.len() - 1) as f64;
    info!("total time    : {runtime:.3} s");
    info!("time per step : {:.3} ms", per_point * 1000.0);
    let stats = AlignStats {
        time_total: runtime,
        time_per_point: per_point,
        log_score: alignment.log_score,
    };
    if alignment.log_score == f64::NEG_INFINITY {
        warn!("no valid alignment found (log-score is -inf); output keeps the anchors");
    }

    info!("writing output geojson");
    let mut dom = input.dom;
    geojson::write_geojson(&mut dom, &config, &stats, &alignment.points, &mut writer).map_err(
        |e| {
            error!("{e}");
            EXIT_OUTPUT
        },
    )?;
    writer.flush().map_err(|e| {
        error!("failed to flush output: {e}");
        EXIT_OUTPUT
    })?;

    if let Some(path) = &config.debug_image {
        info!("rendering debug image {}", path.display());
        save_likelihood(&alignment, &surface, path).map_err(|e| {
            error!("{e}");
            EXIT_DEBUG_IMAGE
        })?;
    }

    info!("done");
    Ok(())
}

fn apply_cli(config: &mut RunConfig, cli: &Cli) {
    if let Some(path) = &cli.image {
        config.image = Some(path.clone());
    }
    if let Some(path) = &cli.linestring {
        config.linestring = Some(path.clone());
    }
    if let Some(path) = &cli.output {
        config.output = Some(path.clone());
    }
    if let Some(path) = &cli.debug_image {
        config.debug_image = Some(path.clone());
    }
    if let Some(pointer) = &cli.pointer {
        config.pointer = pointer.clone();
    }
    if let Some(tag) = &cli.tag {
        config.tag = Some(tag.clone());
    }
    if let Some(window) = cli.max_displace {
        config.window_size = window;
    }
    if let Some(sigma) = cli.kernel_sigma {
        config.sigma = sigma;
    }
    if let Some(stride) = cli.stride {
        config.stride = stride;
    }
    if let Some(subdivide) = cli.subdivide {
        config.subdivide = subdivide;
    }
    if cli.output_full_dom {
        config.output_full_dom = true;
    }
    if cli.png {
        config.format = RasterFormat::Png;
    }
    if cli.tiff {
        if cli.png {
            warn!("--png and --tiff both given; forcing TIFF");
        }
        config.format = RasterFormat::Tiff;
    }
}

fn show_config(config: &RunConfig) {
    match config.to_pretty_json() {
        Ok(json) => println!("{json}"),
        Err(e) => warn!("could not serialize effective config: {e}"),
    }
}
