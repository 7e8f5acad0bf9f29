//! Contour extraction: outer boundaries of foreground regions.
//!
//! Thin wrapper over Suzuki-Abe border following
//! ([`imageproc::contours::find_contours`]). Only outer borders are
//! kept — the inner boundary of a donut-shaped region is not reported
//! separately, matching the reporting semantics of the tracker.
//!
//! Discovery order is the algorithm's raster-scan order, which is stable
//! and reproducible for a given mask. Downstream label numbering depends
//! on that.

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::types::{Contour, Point};

/// Extract the outer boundary of every maximal 8-connected foreground
/// region in the mask, in stable discovery order.
#[must_use = "returns the extracted contours"]
pub fn extract(mask: &GrayImage) -> Vec<Contour> {
    let found: Vec<imageproc::contours::Contour<i32>> =
        imageproc::contours::find_contours(mask);

    found
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(p.x, p.y))
                .collect();
            Contour::new(points)
        })
        .collect()
}
