// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{MontageError, MontageResult};

pub mod config;

pub use config::{Config, DurationGridRule, GridCellSpec, OutputFormat};

/// Rational number used for frame rates and stream time bases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /// Create a new rational
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Convert to floating point, `None` when the denominator is zero
    pub fn to_f64(&self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(self.num as f64 / self.den as f64)
        }
    }

    /// Convert a PTS expressed in this time base to seconds
    pub fn pts_to_seconds(&self, pts: i64) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        pts as f64 * self.num as f64 / self.den as f64
    }

    /// Convert seconds to a PTS expressed in this time base (truncating)
    pub fn seconds_to_pts(&self, seconds: f64) -> i64 {
        if self.num <= 0 || self.den <= 0 {
            return 0;
        }
        (seconds * self.den as f64 / self.num as f64) as i64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Video metadata, produced once per input and read-only afterwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub path: PathBuf,
    /// Duration in seconds
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    /// File size in bytes
    pub file_size: u64,
    pub video_codec: String,
    /// Empty when the file has no audio stream
    pub audio_codec: String,
    /// Container bit rate in bits per second
    pub bit_rate: u64,
    pub avg_frame_rate: Rational,
}

impl VideoInfo {
    /// Average frame rate in frames per second, if known
    pub fn fps(&self) -> Option<f64> {
        self.avg_frame_rate.to_f64()
    }
}

/// Target timestamp for one grid position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledSample {
    pub index: usize,
    /// Requested time in seconds
    pub timestamp: f64,
}

/// A still frame pulled out of the video for one grid position
#[derive(Debug, Clone)]
pub struct ExtractedFrame {
    pub index: usize,
    pub image: RgbImage,
    /// Presentation time of the frame actually decoded, in seconds
    pub timestamp: f64,
}

/// A short window of consecutive frames around a scheduled center time
#[derive(Debug, Clone)]
pub struct VideoClip {
    pub start_time: f64,
    pub end_time: f64,
    pub frames: Vec<RgbImage>,
    /// Center timestamp, used for labels and ordering
    pub timestamp: f64,
}

impl VideoClip {
    /// Clip duration in seconds
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Number of frames in the clip
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Animation-ready frames for one grid cell
#[derive(Debug, Clone)]
pub struct GifClipResult {
    pub frames: Vec<RgbImage>,
    pub frame_duration_ms: u32,
    pub loop_count: u16,
    /// Label timestamp of the source clip
    pub timestamp: f64,
}

/// Size of a single grid thumbnail in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSize {
    /// Resolve the thumbnail size from the configured width/height.
    ///
    /// A configured height of zero or less derives the height from the video
    /// aspect ratio.
    pub fn resolve(thumb_width: u32, thumb_height: i32, info: &VideoInfo) -> MontageResult<Self> {
        if thumb_height > 0 {
            return Ok(Self {
                width: thumb_width,
                height: thumb_height as u32,
            });
        }

        if info.height == 0 || info.width == 0 {
            return Err(MontageError::ZeroHeight {
                path: info.path.clone(),
                width: info.width,
                height: info.height,
            });
        }

        let aspect = info.width as f64 / info.height as f64;
        let height = (thumb_width as f64 / aspect) as u32;
        if height == 0 {
            return Err(MontageError::ZeroHeight {
                path: info.path.clone(),
                width: info.width,
                height: info.height,
            });
        }

        Ok(Self {
            width: thumb_width,
            height,
        })
    }
}

/// Grid dimensions after auto-grid resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridSize {
    pub columns: u32,
    pub rows: u32,
}

impl GridSize {
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of cells in the grid
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.columns, self.rows)
    }
}
