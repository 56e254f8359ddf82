// Adapters - External system implementations

pub mod config_file;
pub mod fs_output;
pub mod image_codec;
pub mod tracing_log;

#[cfg(feature = "libav")]
pub mod decode_libav;
#[cfg(feature = "libav")]
pub mod probe_libav;

// Re-export adapters
pub use config_file::ConfigFileAdapter;
pub use fs_output::FsOutputAdapter;
pub use image_codec::ImageCrateCodec;
pub use tracing_log::{LogFormat, LogSettings, TracingLogAdapter};

#[cfg(feature = "libav")]
pub use decode_libav::LibavDecoder;
#[cfg(feature = "libav")]
pub use probe_libav::ProbeLibavAdapter;

/// Initialize libav and silence its own logging below errors
#[cfg(feature = "libav")]
pub(crate) fn init_libav() -> crate::error::MontageResult<()> {
    ffmpeg_next::init().map_err(|e| crate::error::MontageError::Decode {
        path: std::path::PathBuf::new(),
        message: format!("FFmpeg initialization failed: {}", e),
    })?;
    ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
    Ok(())
}
