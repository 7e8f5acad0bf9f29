//! Color segmentation: classify red pixels into a binary mask.
//!
//! Converts each pixel to HSV (the perceptual space where hue is one
//! axis) and marks it as foreground when it falls inside the union of
//! the configured [`HsvRange`] boxes. Red normally needs two boxes
//! because its hue band wraps across the top of the circular hue axis.
//!
//! This is the first step in the pipeline: RGB frame in, binary mask out.

use image::{GrayImage, RgbImage};

use crate::types::HsvRange;

/// Mask value for a red-candidate pixel.
pub const FOREGROUND: u8 = 255;

/// Mask value for a background pixel.
pub const BACKGROUND: u8 = 0;

/// Convert one RGB pixel to byte-scaled HSV.
///
/// Uses the OpenCV convention: hue in `0..=179` (degrees halved so the
/// full circle fits a byte), saturation and value in `0..=255`. A gray
/// pixel (zero chroma) gets hue 0 and saturation 0.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> [u8; 3] {
    let rf = f32::from(r);
    let gf = f32::from(g);
    let bf = f32::from(b);

    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let value = max;
    let saturation = if max == 0.0 { 0.0 } else { delta / max * 255.0 };

    let hue_deg = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    let hue_deg = if hue_deg < 0.0 {
        hue_deg + 360.0
    } else {
        hue_deg
    };

    // Halve into 0..=179; the modulo folds a rounded 180 back onto 0.
    let hue = ((hue_deg / 2.0).round() as u16 % 180) as u8;
    [hue, saturation.round() as u8, value.round() as u8]
}

/// Produce a binary mask of the pixels inside the union of `ranges`.
///
/// The frame is not mutated; the mask is newly allocated with the same
/// dimensions, [`FOREGROUND`] for matching pixels and [`BACKGROUND`]
/// otherwise. Capture resolution is fixed at startup, so the caller is
/// responsible for only ever passing frames of the configured size.
#[must_use = "returns the binary red-candidate mask"]
pub fn segment(frame: &RgbImage, ranges: &[HsvRange]) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        let image::Rgb([r, g, b]) = *frame.get_pixel(x, y);
        let hsv = rgb_to_hsv(r, g, b);
        if ranges.iter().any(|range| range.contains(hsv)) {
            image::Luma([FOREGROUND])
        } else {
            image::Luma([BACKGROUND])
        }
    })
}
