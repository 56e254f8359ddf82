//! Common utilities and helpers

pub mod color;
pub mod path;
pub mod time;

pub use color::parse_color;
pub use path::{is_video_file, scan_video_files, VIDEO_EXTENSIONS};
pub use time::{format_bitrate, format_duration, format_file_size};
