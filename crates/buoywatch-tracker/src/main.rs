//! Track red buoys in a frame stream and report their pixel coordinates
//! over a serial link.
//!
//! Frames come from a directory of stills (`--frames`) or a synthetic
//! generator (`--synthetic`, the default); coordinates go to the device
//! named by `--device`, or nowhere when that device cannot be opened.
//! Ctrl-C stops the run cleanly after the frame in flight.

mod capture;
mod serial;
mod source;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use buoywatch_pipeline::DetectorConfig;
use clap::Parser;
use tracing::info;

use crate::capture::Tracker;
use crate::serial::SerialLink;
use crate::source::{FileSource, FrameSource, SyntheticSource};

#[derive(Parser)]
#[command(version, about = "Track red buoys and report their pixel coordinates over serial")]
struct Args {
    /// Serial device to report coordinates on.
    #[arg(long, default_value = "/dev/ttyAMA0")]
    device: String,

    /// Serial baud rate.
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Synthetic frame width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Synthetic frame height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Seed for the synthetic frame generator.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Directory of frame images to process instead of synthetic frames.
    #[arg(long, value_name = "DIR", conflicts_with = "synthetic")]
    frames: Option<PathBuf>,

    /// Generate frames procedurally (the default when --frames is absent).
    #[arg(long)]
    synthetic: bool,

    /// Stop after this many frames.
    #[arg(long, value_name = "N")]
    max_frames: Option<u64>,

    /// Write an annotated PNG and a detection readout for every
    /// processed frame into this directory.
    #[arg(long, value_name = "DIR")]
    overlay_dir: Option<PathBuf>,

    /// Detector configuration file (JSON); flags below override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum region area in pixels to count as a detection.
    #[arg(long, value_name = "PX2")]
    min_area: Option<f64>,

    /// Lower bound of the circularity reporting window.
    #[arg(long, value_name = "C")]
    circ_min: Option<f64>,

    /// Upper bound of the circularity reporting window.
    #[arg(long, value_name = "C")]
    circ_max: Option<f64>,

    /// Side length of the square morphology structuring element.
    #[arg(long, value_name = "PX")]
    kernel: Option<u8>,

    /// Log per-detection readouts.
    #[arg(short, long)]
    verbose: bool,
}

/// Load the configuration file if given, then apply flag overrides.
fn resolve_config(args: &Args) -> Result<DetectorConfig, Box<dyn std::error::Error>> {
    let mut config: DetectorConfig = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => DetectorConfig::default(),
    };
    if let Some(min_area) = args.min_area {
        config.min_area = min_area;
    }
    if let Some(min) = args.circ_min {
        config.circularity.min = min;
    }
    if let Some(max) = args.circ_max {
        config.circularity.max = max;
    }
    if let Some(kernel) = args.kernel {
        config.kernel = kernel;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_target(false)
        .init();

    let config = resolve_config(&args)?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })?;

    let source: Box<dyn FrameSource> = match &args.frames {
        Some(dir) => {
            let file_source = FileSource::open(dir)?;
            info!(
                "reading {} frames from {}",
                file_source.len(),
                dir.display()
            );
            Box::new(file_source)
        }
        None => {
            if !args.synthetic {
                info!("no --frames directory given; defaulting to synthetic frames");
            }
            info!(
                "generating {}x{} synthetic frames (seed {})",
                args.width, args.height, args.seed
            );
            Box::new(SyntheticSource::new(args.width, args.height, args.seed))
        }
    };

    let link = SerialLink::open(&args.device, args.baud);

    if let Some(dir) = &args.overlay_dir {
        std::fs::create_dir_all(dir)?;
    }

    let report = Tracker::new(source, link, config, stop)
        .with_max_frames(args.max_frames)
        .with_overlay_dir(args.overlay_dir.clone())
        .run()?;

    info!(
        "done: {} frames processed, {} coordinates delivered",
        report.frames, report.messages
    );
    Ok(())
}
