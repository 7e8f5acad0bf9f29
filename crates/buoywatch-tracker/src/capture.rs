//! The capture loop: frames in, coordinate messages out.
//!
//! One [`Tracker`] owns a frame source, a message sink, and a detector
//! configuration, and runs the acquire -> detect -> report cycle until
//! the source ends, the frame budget is spent, the stop flag is raised,
//! or acquisition fails. Whatever the exit path, the loop drains exactly
//! once: the sink is closed and the state machine lands in `Closed`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use buoywatch_pipeline::{DetectorConfig, RgbImage, detect, overlay, report};
use tracing::{debug, info, warn};

use crate::source::{AcquireError, FrameSource};

/// Where messages produced by the loop go. The serial link is the
/// production implementation; tests substitute a recording sink.
pub trait MessageSink {
    /// Deliver one message. Returns `false` when delivery did not
    /// happen (closed or failing transport); the loop carries on either
    /// way.
    fn deliver(&mut self, line: &str) -> bool;

    /// Release the underlying transport. Called exactly once, during
    /// the loop's drain. Must be idempotent.
    fn close(&mut self);
}

/// Lifecycle of a [`Tracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not yet running.
    Idle,
    /// Processing frames.
    Running,
    /// Releasing resources after the last frame.
    Draining,
    /// Terminal. A closed tracker never runs again.
    Closed,
}

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The stop flag was raised (Ctrl-C or an external supervisor).
    Interrupted,
    /// The frame source reported end of stream.
    SourceExhausted,
    /// The configured maximum frame count was reached.
    FrameBudget,
}

/// Fatal capture failures.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The detector configuration failed validation.
    #[error("invalid detector configuration: {0}")]
    Config(#[from] buoywatch_pipeline::ConfigError),

    /// The frame source broke mid-run.
    #[error("frame acquisition failed: {0}")]
    Acquisition(#[from] AcquireError),
}

/// Tally of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Why the loop stopped.
    pub stop: StopReason,
    /// Frames processed.
    pub frames: u64,
    /// Messages actually delivered by the sink.
    pub messages: u64,
}

/// The capture loop. See the module docs for the lifecycle.
pub struct Tracker<S, M> {
    source: S,
    sink: M,
    config: DetectorConfig,
    stop: Arc<AtomicBool>,
    max_frames: Option<u64>,
    overlay_dir: Option<PathBuf>,
    state: LoopState,
}

impl<S: FrameSource, M: MessageSink> Tracker<S, M> {
    /// Build a tracker over a source and sink. The stop flag is shared:
    /// raising it from any thread ends the run after the frame in
    /// flight.
    #[must_use]
    pub fn new(source: S, sink: M, config: DetectorConfig, stop: Arc<AtomicBool>) -> Self {
        Self {
            source,
            sink,
            config,
            stop,
            max_frames: None,
            overlay_dir: None,
            state: LoopState::Idle,
        }
    }

    /// Stop after this many frames.
    #[must_use]
    pub const fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    /// Dump an annotated PNG of every processed frame into this
    /// directory.
    #[must_use]
    pub fn with_overlay_dir(mut self, overlay_dir: Option<PathBuf>) -> Self {
        self.overlay_dir = overlay_dir;
        self
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Run the loop to completion. Consumes the tracker: `Closed` is
    /// terminal.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Config`] before the first frame when the
    /// configuration is invalid, and [`TrackerError::Acquisition`] when
    /// the source fails mid-run. The drain runs on the error paths too.
    pub fn run(mut self) -> Result<RunReport, TrackerError> {
        self.config.validate()?;

        self.state = LoopState::Running;
        let mut frames: u64 = 0;
        let mut messages: u64 = 0;

        let outcome = loop {
            if self.stop.load(Ordering::Relaxed) {
                break Ok(StopReason::Interrupted);
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break Ok(StopReason::SourceExhausted),
                Err(error) => break Err(TrackerError::Acquisition(error)),
            };

            let detections = detect(&frame, &self.config);
            for detection in &detections {
                debug!(
                    "{}: centroid ({}, {}), circularity {:.3}, area {:.0}",
                    detection.label,
                    detection.centroid.0,
                    detection.centroid.1,
                    detection.circularity,
                    detection.area,
                );
            }

            if let Some(dir) = &self.overlay_dir {
                dump_overlay(dir, frames, frame, &detections);
            }

            for line in report::encode(&detections, self.config.circularity) {
                if self.sink.deliver(&line) {
                    messages += 1;
                }
            }

            frames += 1;
            if self.max_frames.is_some_and(|max| frames >= max) {
                break Ok(StopReason::FrameBudget);
            }
        };

        self.state = LoopState::Draining;
        self.sink.close();
        self.state = LoopState::Closed;

        match outcome {
            Ok(stop) => {
                info!("capture stopped ({stop:?}): {frames} frames, {messages} messages");
                Ok(RunReport {
                    stop,
                    frames,
                    messages,
                })
            }
            Err(error) => Err(error),
        }
    }
}

/// Annotate the frame and write it as `frame-NNNNNN.png`, with the
/// per-detection readout (the text a live display would overlay) as a
/// `frame-NNNNNN.txt` sidecar. Failures are logged and swallowed:
/// diagnostics never take the loop down.
fn dump_overlay(
    dir: &std::path::Path,
    index: u64,
    mut frame: RgbImage,
    detections: &[buoywatch_pipeline::Detection],
) {
    overlay::annotate(&mut frame, detections);
    let path = dir.join(format!("frame-{index:06}.png"));
    if let Err(error) = frame.save(&path) {
        warn!("overlay dump to {} failed: {error}", path.display());
    }

    let readout: String = detections
        .iter()
        .map(|d| {
            format!(
                "{}: centroid ({}, {}), circularity {:.3}, area {:.0}\n",
                d.label, d.centroid.0, d.centroid.1, d.circularity, d.area
            )
        })
        .collect();
    let readout_path = dir.join(format!("frame-{index:06}.txt"));
    if let Err(error) = std::fs::write(&readout_path, readout) {
        warn!(
            "overlay readout to {} failed: {error}",
            readout_path.display()
        );
    }
}
