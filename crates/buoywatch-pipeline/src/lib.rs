//! buoywatch-pipeline: Pure red-buoy detection pipeline (sans-IO).
//!
//! Converts camera frames into scored detections through:
//! HSV segmentation -> morphological cleanup -> contour extraction ->
//! shape scoring -> report encoding.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! rasters and returns structured data. Camera acquisition, the serial
//! link, and the capture loop live in `buoywatch-tracker`.

pub mod contour;
pub mod morphology;
pub mod overlay;
pub mod report;
pub mod score;
pub mod segment;
pub mod types;

pub use types::{
    CircularityWindow, ConfigError, Contour, Detection, DetectorConfig, GrayImage, HsvRange,
    Point, RgbImage,
};

/// Run the detection stages on one frame.
///
/// Segments red pixels into a mask, refines it morphologically, extracts
/// outer contours, and scores them into [`Detection`]s. The frame is
/// borrowed for the duration of the call only; every artifact is
/// recomputed per frame and nothing is retained across calls.
///
/// The returned detections have passed the minimum-area noise filter but
/// **not** the circularity window — apply that via [`report::encode`]
/// when producing wire messages.
#[must_use = "returns the frame's detections"]
pub fn detect(frame: &RgbImage, config: &DetectorConfig) -> Vec<Detection> {
    let mask = segment::segment(frame, &config.ranges);
    let refined = morphology::refine(&mask, config.kernel);
    let contours = contour::extract(&refined);
    score::score(&contours, config.min_area)
}

/// Result of running the detection stages with all intermediate
/// artifacts preserved, for diagnostics and tuning.
#[derive(Debug, Clone)]
pub struct StagedDetection {
    /// Stage 1: raw red-candidate mask.
    pub mask: GrayImage,
    /// Stage 2: morphologically refined mask.
    pub refined: GrayImage,
    /// Stage 3: extracted outer contours, in discovery order.
    pub contours: Vec<Contour>,
    /// Stage 4: scored detections (area-filtered, not circularity-filtered).
    pub detections: Vec<Detection>,
}

/// Like [`detect`], but keeps every stage's output.
#[must_use = "returns all stage outputs"]
pub fn detect_staged(frame: &RgbImage, config: &DetectorConfig) -> StagedDetection {
    let mask = segment::segment(frame, &config.ranges);
    let refined = morphology::refine(&mask, config.kernel);
    let contours = contour::extract(&refined);
    let detections = score::score(&contours, config.min_area);
    StagedDetection {
        mask,
        refined,
        contours,
        detections,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const RED: image::Rgb<u8> = image::Rgb([255, 0, 0]);
    const GREEN: image::Rgb<u8> = image::Rgb([0, 200, 0]);
    const WATER: image::Rgb<u8> = image::Rgb([20, 40, 80]);

    /// 1280x720 frame: one solid disk centered at (640, 360) with radius
    /// 30, plus a handful of sub-5px² speckles away from the disk.
    fn buoy_frame(disk_color: image::Rgb<u8>) -> RgbImage {
        let mut frame = RgbImage::from_pixel(1280, 720, WATER);
        for y in 0..720_i64 {
            for x in 0..1280_i64 {
                let dx = x - 640;
                let dy = y - 360;
                if dx * dx + dy * dy <= 900 {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    frame.put_pixel(x as u32, y as u32, disk_color);
                }
            }
        }
        // 2x2 red speckles (4 px² each, under the 5 px² noise scale).
        for &(sx, sy) in &[(100_u32, 100_u32), (1200, 50), (300, 650), (900, 80)] {
            for dy in 0..2 {
                for dx in 0..2 {
                    frame.put_pixel(sx + dx, sy + dy, RED);
                }
            }
        }
        frame
    }

    #[test]
    fn red_disk_with_speckles_yields_one_message() {
        let config = DetectorConfig::default();
        let detections = detect(&buoy_frame(RED), &config);
        let messages = report::encode(&detections, config.circularity);
        assert_eq!(messages, vec!["640,360\n".to_owned()]);
    }

    #[test]
    fn disks_of_every_reportable_size_stay_inside_the_window() {
        // Refinement squares off small boundaries, which raises the
        // circularity estimate the most for the smallest disks above
        // the 600 px² noise floor. Every size must still encode.
        let config = DetectorConfig::default();
        for radius in (14..=26).chain([30, 40]) {
            let center = 2 * radius + 10;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let size = (4 * radius + 20) as u32;
            let mut frame = RgbImage::from_pixel(size, size, WATER);
            for y in 0..i64::from(size) {
                for x in 0..i64::from(size) {
                    let dx = x - center;
                    let dy = y - center;
                    if dx * dx + dy * dy <= radius * radius {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        frame.put_pixel(x as u32, y as u32, RED);
                    }
                }
            }

            let detections = detect(&frame, &config);
            assert_eq!(detections.len(), 1, "radius {radius}");
            let detection = &detections[0];
            assert!(
                config.circularity.contains(detection.circularity),
                "radius {radius} scored {} outside the window",
                detection.circularity
            );
            let messages = report::encode(&detections, config.circularity);
            assert_eq!(
                messages,
                vec![format!("{center},{center}\n")],
                "radius {radius}"
            );
        }
    }

    #[test]
    fn recolored_disk_yields_no_messages() {
        let config = DetectorConfig::default();
        let frame = buoy_frame(GREEN);
        // The green speckle-free disk is outside both red hue bands, and
        // the red speckles are erased by the opening.
        let detections = detect(&frame, &config);
        let messages = report::encode(&detections, config.circularity);
        assert!(messages.is_empty(), "got {messages:?}");
    }

    #[test]
    fn pipeline_is_deterministic() {
        let config = DetectorConfig::default();
        let frame = buoy_frame(RED);
        let first = report::encode(&detect(&frame, &config), config.circularity);
        let second = report::encode(&detect(&frame, &config), config.circularity);
        assert_eq!(first, second);
        assert_eq!(
            first.concat().into_bytes(),
            second.concat().into_bytes(),
            "repeated runs must be byte-identical"
        );
    }

    #[test]
    fn sub_threshold_regions_never_reach_the_encoder() {
        // Lots of perfectly round but tiny disks: all speckle-sized
        // regions die in refinement or the area filter, regardless of
        // their circularity.
        let mut frame = RgbImage::from_pixel(200, 200, WATER);
        for &(cx, cy) in &[(30_i64, 30_i64), (90, 90), (150, 40)] {
            for y in 0..200_i64 {
                for x in 0..200_i64 {
                    let dx = x - cx;
                    let dy = y - cy;
                    if dx * dx + dy * dy <= 36 {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        frame.put_pixel(x as u32, y as u32, RED);
                    }
                }
            }
        }
        let config = DetectorConfig::default();
        let staged = detect_staged(&frame, &config);
        // The disks survive refinement (radius 6 beats the 5x5 element)
        // but are far below the 600 px² noise floor.
        assert!(!staged.contours.is_empty());
        assert!(staged.detections.is_empty());
        let messages = report::encode(&staged.detections, config.circularity);
        assert!(messages.is_empty());
    }

    #[test]
    fn staged_output_is_consistent_with_detect() {
        let config = DetectorConfig::default();
        let frame = buoy_frame(RED);
        let staged = detect_staged(&frame, &config);
        assert_eq!(staged.detections, detect(&frame, &config));
        assert_eq!(staged.mask.dimensions(), (1280, 720));
        assert_eq!(staged.refined.dimensions(), (1280, 720));
    }

    #[test]
    fn detection_boundary_is_retained() {
        let config = DetectorConfig::default();
        let detections = detect(&buoy_frame(RED), &config);
        assert_eq!(detections.len(), 1);
        assert!(
            detections[0].boundary.len() > 50,
            "disk boundary should have a dense point chain"
        );
    }
}
