//! Report encoding: serialize qualifying detections for the serial link.
//!
//! The wire protocol is deliberately minimal: one ASCII line per
//! qualifying detection, `"{x},{y}\n"`, nothing else — no checksum, no
//! framing beyond the trailing newline. The consuming controller parses
//! integer pairs and nothing more.

use crate::types::{CircularityWindow, Detection};

/// Encode every detection whose circularity falls inside the window
/// (inclusive on both bounds) as a `"{x},{y}\n"` message.
///
/// Detection order is preserved. No area filtering happens here: the
/// minimum-area noise filter already ran in the scorer, and this stage
/// applies only the shape-discrimination window.
#[must_use = "returns the encoded messages"]
pub fn encode(detections: &[Detection], window: CircularityWindow) -> Vec<String> {
    detections
        .iter()
        .filter(|d| window.contains(d.circularity))
        .map(|d| format!("{},{}\n", d.centroid.0, d.centroid.1))
        .collect()
}
