//! Diagnostic overlay: annotate a frame with its detections.
//!
//! Draws every surviving-area detection — not just the ones inside the
//! circularity window — so an operator can see what the shape filter is
//! rejecting. Boundary in green, centroid marker in blue, matching the
//! deployed tracker's display colors. Purely cosmetic: the pipeline's
//! outputs are unaffected and drawing cannot fail.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::types::Detection;

/// Boundary outline color.
const BOUNDARY: Rgb<u8> = Rgb([0, 255, 0]);

/// Centroid marker color.
const CENTROID: Rgb<u8> = Rgb([0, 0, 255]);

/// Centroid marker radius in pixels.
const MARKER_RADIUS: i32 = 4;

/// Draw boundary outlines and centroid markers for all detections onto
/// the frame, in place. Out-of-bounds geometry is clipped by the drawing
/// primitives, never an error.
pub fn annotate(frame: &mut RgbImage, detections: &[Detection]) {
    for detection in detections {
        let points = detection.boundary.points();
        let n = points.len();
        if n >= 2 {
            for i in 0..n {
                let p = points[i];
                let q = points[(i + 1) % n];
                #[allow(clippy::cast_precision_loss)]
                draw_line_segment_mut(
                    frame,
                    (p.x as f32, p.y as f32),
                    (q.x as f32, q.y as f32),
                    BOUNDARY,
                );
            }
        }

        let (cx, cy) = detection.centroid;
        draw_filled_circle_mut(frame, (cx, cy), MARKER_RADIUS, CENTROID);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Contour, Point};

    fn square_detection() -> Detection {
        Detection {
            label: "Object 1".to_owned(),
            centroid: (20, 20),
            circularity: 0.9,
            area: 100.0,
            boundary: Contour::new(vec![
                Point::new(15, 15),
                Point::new(25, 15),
                Point::new(25, 25),
                Point::new(15, 25),
            ]),
        }
    }

    #[test]
    fn empty_detection_list_leaves_frame_unchanged() {
        let mut frame = RgbImage::new(40, 40);
        let before = frame.clone();
        annotate(&mut frame, &[]);
        assert_eq!(frame, before);
    }

    #[test]
    fn boundary_is_drawn_in_green() {
        let mut frame = RgbImage::new(40, 40);
        annotate(&mut frame, &[square_detection()]);
        assert_eq!(*frame.get_pixel(20, 15), BOUNDARY);
        assert_eq!(*frame.get_pixel(15, 20), BOUNDARY);
    }

    #[test]
    fn centroid_marker_is_drawn_in_blue() {
        let mut frame = RgbImage::new(40, 40);
        annotate(&mut frame, &[square_detection()]);
        assert_eq!(*frame.get_pixel(20, 20), CENTROID);
    }

    #[test]
    fn dimensions_are_preserved() {
        let mut frame = RgbImage::new(37, 23);
        annotate(&mut frame, &[square_detection()]);
        assert_eq!(frame.dimensions(), (37, 23));
    }

    #[test]
    fn out_of_bounds_geometry_is_clipped() {
        let mut frame = RgbImage::new(10, 10);
        let detection = Detection {
            centroid: (50, 50),
            ..square_detection()
        };
        annotate(&mut frame, &[detection]);
        assert_eq!(frame.dimensions(), (10, 10));
    }
}
