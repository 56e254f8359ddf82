// Probe LibAV adapter - Video metadata using libav

use std::path::Path;

use async_trait::async_trait;
use ffmpeg_next::media::Type;
use tracing::debug;

use crate::domain::model::{Rational, VideoInfo};
use crate::error::{MontageError, MontageResult};
use crate::ports::ProbePort;

/// LibAV-based metadata probe
#[derive(Debug, Clone, Copy)]
pub struct ProbeLibavAdapter;

impl ProbeLibavAdapter {
    /// Create a new probing adapter
    pub fn new() -> MontageResult<Self> {
        super::init_libav()?;
        Ok(Self)
    }

    /// Probe synchronously; libav calls block
    pub fn probe_blocking(path: &Path) -> MontageResult<VideoInfo> {
        let file_size = std::fs::metadata(path)?.len();

        let input = ffmpeg_next::format::input(path)
            .map_err(|e| MontageError::decode(path, format!("Failed to open input: {}", e)))?;

        let video = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| MontageError::NoVideoStream {
                path: path.to_path_buf(),
            })?;

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(video.parameters())
            .map_err(|e| MontageError::decode(path, format!("Failed to create decoder context: {}", e)))?
            .decoder()
            .video()
            .map_err(|e| MontageError::decode(path, format!("Failed to create video decoder: {}", e)))?;

        // Prefer the container duration, fall back to the stream's
        let duration = if input.duration() > 0 {
            input.duration() as f64 / ffmpeg_next::ffi::AV_TIME_BASE as f64
        } else {
            let tb = video.time_base();
            Rational::new(tb.numerator(), tb.denominator()).pts_to_seconds(video.duration().max(0))
        };

        let frame_rate = video.avg_frame_rate();
        let audio_codec = input
            .streams()
            .best(Type::Audio)
            .map(|audio| audio.parameters().id().name().to_string())
            .unwrap_or_default();

        let info = VideoInfo {
            path: path.to_path_buf(),
            duration,
            width: decoder.width(),
            height: decoder.height(),
            file_size,
            video_codec: video.parameters().id().name().to_string(),
            audio_codec,
            bit_rate: u64::try_from(input.bit_rate()).unwrap_or(0),
            avg_frame_rate: Rational::new(frame_rate.numerator(), frame_rate.denominator()),
        };

        debug!(
            "Probed {}: {:.2}s, {}x{}, {}",
            path.display(),
            info.duration,
            info.width,
            info.height,
            info.video_codec
        );
        Ok(info)
    }
}

#[async_trait]
impl ProbePort for ProbeLibavAdapter {
    async fn probe(&self, path: &Path) -> MontageResult<VideoInfo> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::probe_blocking(&path))
            .await
            .map_err(|e| MontageError::Worker {
                message: e.to_string(),
            })?
    }
}
