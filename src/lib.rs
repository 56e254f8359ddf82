//! Video contact sheet library
//!
//! Samples evenly spaced frames (or short clips) from a video, decoding each
//! sample in its own session on a bounded worker pool, and lays them out on a
//! grid under a metadata header. Output is a JPEG contact sheet or an animated
//! GIF grid.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod output;
pub mod planner;
pub mod ports;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use domain::model::{Config, GifClipResult, OutputFormat, VideoClip, VideoInfo};
pub use error::{MontageError, MontageResult};

/// Initialize the media backend
#[cfg(feature = "libav")]
pub fn init() -> MontageResult<()> {
    adapters::init_libav()
}
