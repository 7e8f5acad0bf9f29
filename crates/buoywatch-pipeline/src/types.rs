//! Shared types for the buoywatch detection pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference binary masks
/// without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference camera frames
/// without depending on `image` directly.
pub use image::RgbImage;

/// A 2D point in image coordinates (integer pixel grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An ordered, implicitly closed boundary of one connected foreground
/// region: the last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a contour from an ordered vector of boundary points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of boundary points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Slice of all boundary points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the contour and returns the underlying point vector.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// One convex box in HSV space, byte-scaled per the OpenCV convention:
/// hue in `0..=179` (degrees halved), saturation and value in `0..=255`.
///
/// A pixel matches when all three components lie within the inclusive
/// bounds. Red needs two of these because its hue band wraps across the
/// top of the circular hue axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    /// Inclusive lower bound as `[h, s, v]`.
    pub lower: [u8; 3],
    /// Inclusive upper bound as `[h, s, v]`.
    pub upper: [u8; 3],
}

impl HsvRange {
    /// Create a range from inclusive lower and upper `[h, s, v]` bounds.
    #[must_use]
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Whether an HSV triple falls inside this range (inclusive).
    #[must_use]
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| self.lower[i] <= hsv[i] && hsv[i] <= self.upper[i])
    }
}

/// Inclusive circularity acceptance window: the shape filter that decides
/// which detections are reported as buoys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularityWindow {
    /// Inclusive lower bound.
    pub min: f64,
    /// Inclusive upper bound.
    pub max: f64,
}

impl CircularityWindow {
    /// Create a window from inclusive bounds.
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether a circularity score falls inside the window. Both bounds
    /// are inclusive, so a score exactly at `min` or `max` is accepted.
    #[must_use]
    pub fn contains(&self, circularity: f64) -> bool {
        self.min <= circularity && circularity <= self.max
    }
}

/// A scored candidate region that survived the minimum-area filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Sequential name, `"Object N"` with N the 1-based discovery index
    /// among all contours in the frame (including ones later discarded
    /// by the area filter, so labels may be non-contiguous).
    pub label: String,

    /// Area-weighted geometric center, rounded to the pixel grid.
    pub centroid: (i32, i32),

    /// Shape score `4π·area / perimeter²`: 1.0 for a perfect circle,
    /// lower for elongated or irregular shapes. Capped at 1.0; the cap
    /// absorbs discretization overshoot on small round regions.
    pub circularity: f64,

    /// Enclosed area in pixels.
    pub area: f64,

    /// Outer boundary of the region.
    pub boundary: Contour,
}

/// Configuration for the detection pipeline.
///
/// Immutable after construction; the defaults are the tuned constants of
/// the deployed tracker (low-light red profile, 600 px² noise floor,
/// [0.75, 1.0] buoy window, 5×5 structuring element).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// HSV boxes whose union defines "red". Kept as a list rather than a
    /// fixed pair so tuning profiles can add or drop bands.
    pub ranges: Vec<HsvRange>,

    /// Minimum enclosed area in pixels for a contour to become a
    /// [`Detection`]. A noise filter, not a buoy filter.
    pub min_area: f64,

    /// Circularity acceptance window applied at reporting time.
    pub circularity: CircularityWindow,

    /// Side length of the square morphology structuring element.
    pub kernel: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            // Two bands because red wraps around the hue axis.
            ranges: vec![
                HsvRange::new([0, 150, 100], [10, 255, 255]),
                HsvRange::new([150, 110, 0], [179, 255, 255]),
            ],
            min_area: 600.0,
            circularity: CircularityWindow::new(0.75, 1.0),
            kernel: 5,
        }
    }
}

impl DetectorConfig {
    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the range list is empty, a range has
    /// a lower bound above its upper bound, a hue bound exceeds 179, the
    /// minimum area is negative or non-finite, the circularity window is
    /// inverted, or the kernel is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranges.is_empty() {
            return Err(ConfigError::NoColorRanges);
        }
        for range in &self.ranges {
            if range.lower[0] > 179 || range.upper[0] > 179 {
                return Err(ConfigError::HueOutOfRange);
            }
            if (0..3).any(|i| range.lower[i] > range.upper[i]) {
                return Err(ConfigError::InvertedColorRange);
            }
        }
        if !self.min_area.is_finite() || self.min_area < 0.0 {
            return Err(ConfigError::InvalidMinArea(self.min_area));
        }
        if self.circularity.min > self.circularity.max {
            return Err(ConfigError::InvertedCircularityWindow);
        }
        if self.kernel == 0 {
            return Err(ConfigError::ZeroKernel);
        }
        Ok(())
    }
}

/// Configuration validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The HSV range list is empty; nothing could ever match.
    #[error("color range list is empty")]
    NoColorRanges,

    /// A hue bound exceeds the OpenCV-scaled maximum of 179.
    #[error("hue bound exceeds 179")]
    HueOutOfRange,

    /// A range has lower > upper in some component.
    #[error("color range has a lower bound above its upper bound")]
    InvertedColorRange,

    /// The minimum area is negative or not finite.
    #[error("minimum area must be finite and non-negative, got {0}")]
    InvalidMinArea(f64),

    /// The circularity window has min > max.
    #[error("circularity window has min above max")]
    InvertedCircularityWindow,

    /// The structuring element side length is zero.
    #[error("structuring element size must be at least 1")]
    ZeroKernel,
}
