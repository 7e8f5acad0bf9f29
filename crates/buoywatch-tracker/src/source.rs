//! Frame acquisition: where the capture loop gets its images.
//!
//! Camera drivers stay outside this crate; the shipped sources cover
//! offline runs (a directory of still frames) and self-contained demo
//! or soak runs (procedurally generated frames). Both hand out plain
//! [`RgbImage`]s, so the capture loop never knows the difference.

use std::fs;
use std::io;
use std::path::PathBuf;

use buoywatch_pipeline::RgbImage;

/// Frame acquisition failures. Fatal to the capture loop: a source that
/// cannot produce frames has nothing to recover to.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// The frame directory could not be listed.
    #[error("failed to read frame directory {path}: {source}")]
    ListDirectory {
        /// Directory that was being listed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A frame file could not be read or decoded.
    #[error("failed to decode frame {path}: {source}")]
    Decode {
        /// File that was being decoded.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },
}

/// A sequential producer of camera-style frames.
///
/// `Ok(None)` means the stream ended normally; an error means the
/// source is broken and the capture loop should drain.
pub trait FrameSource {
    /// Produce the next frame, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError`] when a frame exists but cannot be
    /// produced.
    fn next_frame(&mut self) -> Result<Option<RgbImage>, AcquireError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, AcquireError> {
        (**self).next_frame()
    }
}

/// Frames read from image files in a directory, in file-name order.
///
/// Recognizes the extensions the decoder is built with (`png`, `jpg`,
/// `jpeg`, `bmp`, case-insensitive); everything else in the directory is
/// ignored. Decoding is lazy, one file per `next_frame` call.
pub struct FileSource {
    files: Vec<PathBuf>,
    cursor: usize,
}

impl FileSource {
    /// List the directory and sort the recognized frame files by name.
    ///
    /// # Errors
    ///
    /// Returns [`AcquireError::ListDirectory`] when the directory cannot
    /// be read.
    pub fn open(dir: &std::path::Path) -> Result<Self, AcquireError> {
        let entries = fs::read_dir(dir).map_err(|source| AcquireError::ListDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| AcquireError::ListDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if has_frame_extension(&path) {
                files.push(path);
            }
        }
        files.sort();

        Ok(Self { files, cursor: 0 })
    }

    /// Number of frame files found at open time.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the directory contained no frame files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn has_frame_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ext.eq_ignore_ascii_case("png")
                || ext.eq_ignore_ascii_case("jpg")
                || ext.eq_ignore_ascii_case("jpeg")
                || ext.eq_ignore_ascii_case("bmp")
        })
}

impl FrameSource for FileSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, AcquireError> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        let frame = image::open(path)
            .map_err(|source| AcquireError::Decode {
                path: path.clone(),
                source,
            })?
            .into_rgb8();
        Ok(Some(frame))
    }
}

/// Water-blue background color of generated frames.
const WATER: image::Rgb<u8> = image::Rgb([18, 42, 86]);

/// Buoy color of generated frames (inside the default red hue bands).
const BUOY: image::Rgb<u8> = image::Rgb([235, 20, 25]);

/// Endless procedurally generated frames: one red disk drifting slowly
/// around the frame center over water-colored background, plus a few
/// speckle-sized red dots at pseudo-random positions.
///
/// Deterministic for a given seed, so repeated runs produce
/// byte-identical frame sequences. Bound the run with the capture
/// loop's frame budget; the source itself never ends.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    radius: i64,
    frame_index: u64,
    rng: u64,
}

impl SyntheticSource {
    /// Disk radius of generated buoys.
    const RADIUS: i64 = 30;

    /// Number of 2x2 speckles scattered per frame.
    const SPECKLES: u32 = 6;

    /// Create a source producing `width` x `height` frames.
    #[must_use]
    pub const fn new(width: u32, height: u32, seed: u64) -> Self {
        Self {
            width,
            height,
            radius: Self::RADIUS,
            frame_index: 0,
            // xorshift must not start at zero.
            rng: seed | 1,
        }
    }

    fn next_random(&mut self) -> u64 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        x
    }

    /// Disk center for a given frame: a slow horizontal sweep around the
    /// frame center, wrapping every 40 frames.
    fn disk_center(&self) -> (i64, i64) {
        let cx = i64::from(self.width) / 2;
        let cy = i64::from(self.height) / 2;
        #[allow(clippy::cast_possible_wrap)]
        let phase = (self.frame_index % 40) as i64 - 20;
        (cx + phase, cy)
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, AcquireError> {
        let mut frame = RgbImage::from_pixel(self.width, self.height, WATER);

        let (cx, cy) = self.disk_center();
        let r2 = self.radius * self.radius;
        for y in 0..i64::from(self.height) {
            for x in 0..i64::from(self.width) {
                let dx = x - cx;
                let dy = y - cy;
                if dx * dx + dy * dy <= r2 {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    frame.put_pixel(x as u32, y as u32, BUOY);
                }
            }
        }

        if self.width > 2 && self.height > 2 {
            for _ in 0..Self::SPECKLES {
                #[allow(clippy::cast_possible_truncation)]
                let sx = (self.next_random() % u64::from(self.width - 2)) as u32;
                #[allow(clippy::cast_possible_truncation)]
                let sy = (self.next_random() % u64::from(self.height - 2)) as u32;
                for dy in 0..2 {
                    for dx in 0..2 {
                        frame.put_pixel(sx + dx, sy + dy, BUOY);
                    }
                }
            }
        }

        self.frame_index += 1;
        Ok(Some(frame))
    }
}
