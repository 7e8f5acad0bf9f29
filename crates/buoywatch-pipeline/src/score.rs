//! Shape scoring: area, centroid, perimeter, and circularity per contour.
//!
//! Turns raw contours into [`Detection`]s. The minimum-area threshold
//! applied here is a noise filter; the circularity window that decides
//! what gets reported as a buoy is applied later, in the report encoder.
//! The two thresholds are deliberately decoupled.

use std::f64::consts::PI;

use crate::types::{Contour, Detection, Point};

/// Chain-step length for an axial (horizontal/vertical) move.
const AXIAL_STEP: f64 = 0.99;

/// Chain-step length for a diagonal move.
///
/// Geometric step lengths (1 and √2) overestimate a digitized circle's
/// true perimeter by about 5%, which would drag a perfect buoy's
/// circularity down to ~0.90 and out of reach of an acceptance window
/// anchored at 1.0. The weights are calibrated against rasterized disks
/// of radius 8 through 60, both raw-traced and after the 5×5 open/close
/// (refinement squares off small boundaries and shortens them further),
/// so every disk scores above 0.96 while 6:1 rectangles stay below
/// 0.45. Residual overshoot past 1.0 on small refined disks is clipped
/// by [`circularity`]'s cap.
const DIAGONAL_STEP: f64 = 1.32;

/// Twice the signed shoelace area of the closed boundary polygon.
///
/// Positive or negative depending on winding; zero for degenerate
/// (collinear or self-cancelling) boundaries.
fn shoelace_sum(points: &[Point]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        sum += f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
    }
    sum
}

/// Number of lattice points on the closed boundary polygon.
///
/// Each edge contributes `gcd(|dx|, |dy|)` points (its interior lattice
/// points plus one endpoint), so the closed walk counts every boundary
/// point exactly once.
fn boundary_lattice_points(points: &[Point]) -> f64 {
    let n = points.len();
    let mut count: u64 = 0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        count += gcd(p.x.abs_diff(q.x), p.y.abs_diff(q.y));
    }
    count as f64
}

fn gcd(a: u32, b: u32) -> u64 {
    let (mut a, mut b) = (u64::from(a), u64::from(b));
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Enclosed area of a contour in pixels.
///
/// Shoelace area of the boundary polygon (which runs through pixel
/// centers) converted to the enclosed pixel count via Pick's theorem:
/// `pixels = interior + boundary = shoelace + boundary/2 + 1`. Exact
/// for simple lattice polygons; a lone pixel comes out as 1.
#[must_use]
pub fn area(contour: &Contour) -> f64 {
    let points = contour.points();
    if points.is_empty() {
        return 0.0;
    }
    shoelace_sum(points).abs() / 2.0 + boundary_lattice_points(points) / 2.0 + 1.0
}

/// Closed-path arc length of the boundary.
///
/// Unit chain steps use the calibrated weights ([`AXIAL_STEP`],
/// [`DIAGONAL_STEP`]); longer edges (possible when collinear points were
/// compressed away) fall back to Euclidean length.
#[must_use]
pub fn perimeter(contour: &Contour) -> f64 {
    let points = contour.points();
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let mut length = 0.0;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let dx = p.x.abs_diff(q.x);
        let dy = p.y.abs_diff(q.y);
        length += match (dx, dy) {
            (0, 0) => 0.0,
            (0, 1) | (1, 0) => AXIAL_STEP,
            (1, 1) => DIAGONAL_STEP,
            _ => f64::from(dx).hypot(f64::from(dy)),
        };
    }
    length
}

/// Circularity `4π·area / perimeter²`, capped at 1.0.
///
/// 1.0 for a perfect circle, decreasing toward 0 for elongated or
/// irregular shapes. No real shape exceeds 1 (the isoperimetric
/// inequality), so any estimate above it is a discretization artifact
/// of the chain-length perimeter; the cap clips those, keeping
/// near-perfect digital circles from overshooting out the top of an
/// acceptance window. Returns 0 when perimeter or area is zero
/// (degenerate single-point boundaries).
#[must_use]
pub fn circularity(area: f64, perimeter: f64) -> f64 {
    if perimeter == 0.0 || area == 0.0 {
        return 0.0;
    }
    (4.0 * PI * area / (perimeter * perimeter)).min(1.0)
}

/// Score contours into detections, in discovery order.
///
/// Contours below `min_area` are dropped (noise filter), as are
/// degenerate boundaries with zero polygon area (the moments-based
/// centroid would divide by zero). Labels are `"Object N"` with N the
/// 1-based index among *all* input contours, so numbering is unaffected
/// by the filters and may end up non-contiguous.
#[must_use = "returns the scored detections"]
pub fn score(contours: &[Contour], min_area: f64) -> Vec<Detection> {
    let mut detections = Vec::new();
    for (index, contour) in contours.iter().enumerate() {
        let area = area(contour);
        if area < min_area {
            continue;
        }

        // First-order moments centroid of the boundary polygon. A zero
        // shoelace sum means a degenerate (collinear or self-touching)
        // boundary with no well-defined centroid.
        let points = contour.points();
        let shoelace = shoelace_sum(points);
        if shoelace == 0.0 {
            continue;
        }
        let n = points.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let p = points[i];
            let q = points[(i + 1) % n];
            let cross =
                f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
            cx += (f64::from(p.x) + f64::from(q.x)) * cross;
            cy += (f64::from(p.y) + f64::from(q.y)) * cross;
        }
        cx /= 3.0 * shoelace;
        cy /= 3.0 * shoelace;

        let perimeter = perimeter(contour);

        #[allow(clippy::cast_possible_truncation)]
        detections.push(Detection {
            label: format!("Object {}", index + 1),
            centroid: (cx.round() as i32, cy.round() as i32),
            circularity: circularity(area, perimeter),
            area,
            boundary: contour.clone(),
        });
    }
    detections
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::contour::extract;
    use image::GrayImage;

    const FG: image::Luma<u8> = image::Luma([255]);

    /// Mask containing a filled digital disk of the given radius.
    fn disk_mask(radius: i64, center: (i64, i64), size: (u32, u32)) -> GrayImage {
        let mut mask = GrayImage::new(size.0, size.1);
        for y in 0..size.1 {
            for x in 0..size.0 {
                let dx = i64::from(x) - center.0;
                let dy = i64::from(y) - center.1;
                if dx * dx + dy * dy <= radius * radius {
                    mask.put_pixel(x, y, FG);
                }
            }
        }
        mask
    }

    fn rect_mask(x0: u32, y0: u32, w: u32, h: u32, size: (u32, u32)) -> GrayImage {
        let mut mask = GrayImage::new(size.0, size.1);
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, FG);
            }
        }
        mask
    }

    #[test]
    fn disk_radius_30_scores_near_perfect_circle() {
        let mask = disk_mask(30, (35, 35), (71, 71));
        let contours = extract(&mask);
        assert_eq!(contours.len(), 1);
        let detections = score(&contours, 0.0);
        assert_eq!(detections.len(), 1);

        let d = &detections[0];
        let true_area = std::f64::consts::PI * 900.0;
        assert!(
            (d.area - true_area).abs() / true_area <= 0.02,
            "area {} deviates more than 2% from {true_area}",
            d.area
        );
        assert!(
            (d.circularity - 1.0).abs() <= 0.05,
            "circularity {} not within 0.05 of 1.0",
            d.circularity
        );
        assert_eq!(d.centroid, (35, 35));
    }

    #[test]
    fn disk_radius_10_scores_near_perfect_circle() {
        let mask = disk_mask(10, (15, 15), (31, 31));
        let detections = score(&extract(&mask), 0.0);
        assert_eq!(detections.len(), 1);
        let d = &detections[0];
        let true_area = std::f64::consts::PI * 100.0;
        assert!((d.area - true_area).abs() / true_area <= 0.02);
        assert!((d.circularity - 1.0).abs() <= 0.05);
    }

    #[test]
    fn thin_rectangle_scores_below_half() {
        // 10:1 aspect ratio.
        let mask = rect_mask(3, 3, 60, 6, (70, 14));
        let detections = score(&extract(&mask), 0.0);
        assert_eq!(detections.len(), 1);
        assert!(
            detections[0].circularity < 0.5,
            "elongated shape scored {}",
            detections[0].circularity
        );
    }

    #[test]
    fn six_to_one_rectangle_scores_below_half() {
        let mask = rect_mask(3, 3, 36, 6, (44, 14));
        let detections = score(&extract(&mask), 0.0);
        assert_eq!(detections.len(), 1);
        assert!(detections[0].circularity < 0.5);
    }

    #[test]
    fn rectangle_area_is_exact_pixel_count() {
        let mask = rect_mask(3, 3, 12, 9, (20, 16));
        let detections = score(&extract(&mask), 0.0);
        assert!((detections[0].area - 108.0).abs() < 1e-9);
    }

    #[test]
    fn odd_square_centroid_is_exact() {
        // 9x9 square at (5, 5): center pixel (9, 9).
        let mask = rect_mask(5, 5, 9, 9, (20, 20));
        let detections = score(&extract(&mask), 0.0);
        assert_eq!(detections[0].centroid, (9, 9));
    }

    #[test]
    fn small_contours_are_filtered_by_area() {
        let mut mask = rect_mask(3, 3, 4, 4, (60, 60));
        // Big region below the small one.
        for y in 20..50 {
            for x in 20..50 {
                mask.put_pixel(x, y, FG);
            }
        }
        let detections = score(&extract(&mask), 600.0);
        assert_eq!(detections.len(), 1);
        assert!(detections[0].area >= 600.0);
    }

    #[test]
    fn labels_keep_pre_filter_numbering() {
        // Small region discovered first (raster order), then a big one;
        // the survivor keeps its discovery index.
        let mut mask = rect_mask(3, 3, 4, 4, (60, 60));
        for y in 20..50 {
            for x in 20..50 {
                mask.put_pixel(x, y, FG);
            }
        }
        let detections = score(&extract(&mask), 600.0);
        assert_eq!(detections[0].label, "Object 2");
    }

    #[test]
    fn labels_follow_discovery_order_when_all_survive() {
        let mut mask = rect_mask(3, 3, 10, 10, (60, 60));
        for y in 30..45 {
            for x in 30..45 {
                mask.put_pixel(x, y, FG);
            }
        }
        let detections = score(&extract(&mask), 0.0);
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].label, "Object 1");
        assert_eq!(detections[1].label, "Object 2");
    }

    #[test]
    fn degenerate_collinear_contour_is_discarded() {
        // A straight out-and-back boundary: zero polygon area.
        let contour = Contour::new(vec![
            Point::new(0, 0),
            Point::new(1, 0),
            Point::new(2, 0),
            Point::new(1, 0),
        ]);
        let detections = score(&[contour], 0.0);
        assert!(detections.is_empty());
    }

    #[test]
    fn circularity_guards_zero_inputs() {
        assert!((circularity(0.0, 10.0)).abs() < f64::EPSILON);
        assert!((circularity(10.0, 0.0)).abs() < f64::EPSILON);
    }

    #[test]
    fn circularity_caps_at_the_ideal_circle_value() {
        // 4π·1000 / 50² is well above 1; no real shape can exceed the
        // isoperimetric bound, so the estimate is clipped to it.
        assert!((circularity(1000.0, 50.0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn single_point_contour_has_zero_perimeter() {
        let contour = Contour::new(vec![Point::new(4, 4)]);
        assert!((perimeter(&contour)).abs() < f64::EPSILON);
        assert!((area(&contour) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn detections_are_not_sorted_by_score() {
        // An elongated region first, a round one second; output keeps
        // discovery order even though the second scores higher.
        let mut mask = rect_mask(3, 3, 30, 4, (90, 90));
        for y in 40..70 {
            for x in 40..70 {
                let dx = i64::from(x) - 55;
                let dy = i64::from(y) - 55;
                if dx * dx + dy * dy <= 144 {
                    mask.put_pixel(x, y, FG);
                }
            }
        }
        let detections = score(&extract(&mask), 0.0);
        assert_eq!(detections.len(), 2);
        assert!(detections[0].circularity < detections[1].circularity);
    }
}
