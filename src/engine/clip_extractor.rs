//! Short clip extraction for animated montages

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::domain::model::*;
use crate::domain::rules::ClipWindow;
use crate::engine::{fit_thumbnail, WorkerPool};
use crate::error::{MontageError, MontageResult};
use crate::ports::{DecodeSession, ImageCodec, MediaDecoder, StreamInfo};

/// Clip window relative to each scheduled center time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipOffsets {
    /// Offset of the window start, usually negative
    pub start: f64,
    /// Offset of the window end, usually positive
    pub end: f64,
}

impl ClipOffsets {
    pub fn from_config(config: &Config) -> Self {
        let (start, end) = config.gif_clip_offsets();
        Self { start, end }
    }
}

/// Extracts one short clip per scheduled center time, in parallel
pub struct ClipExtractor {
    decoder: Arc<dyn MediaDecoder>,
    codec: Arc<dyn ImageCodec>,
    pool: WorkerPool,
}

impl ClipExtractor {
    /// Create an extractor running at most `max_workers` decode sessions at once
    pub fn new(decoder: Arc<dyn MediaDecoder>, codec: Arc<dyn ImageCodec>, max_workers: usize) -> Self {
        Self {
            decoder,
            codec,
            pool: WorkerPool::new(max_workers),
        }
    }

    /// Extract a clip around every center; the result is sorted by center time
    pub async fn extract(
        &self,
        info: &VideoInfo,
        centers: &[ScheduledSample],
        offsets: ClipOffsets,
        size: ThumbnailSize,
    ) -> MontageResult<Vec<VideoClip>> {
        if centers.is_empty() {
            return Err(MontageError::invalid_range("no clips to extract"));
        }

        info!(
            "Extracting {} clips from {} with {} workers",
            centers.len(),
            info.path.display(),
            self.pool.workers_for(centers.len())
        );

        let decoder = Arc::clone(&self.decoder);
        let codec = Arc::clone(&self.codec);
        let path = info.path.clone();
        let duration = info.duration;

        let mut clips = self
            .pool
            .run(centers.to_vec(), move |sample| {
                Self::extract_one(
                    decoder.as_ref(),
                    codec.as_ref(),
                    &path,
                    duration,
                    sample.timestamp,
                    offsets,
                    size,
                )
            })
            .await?;

        clips.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Ok(clips)
    }

    /// Extract a single clip with its own decode session
    pub fn extract_one(
        decoder: &dyn MediaDecoder,
        codec: &dyn ImageCodec,
        path: &Path,
        duration: f64,
        center: f64,
        offsets: ClipOffsets,
        size: ThumbnailSize,
    ) -> MontageResult<VideoClip> {
        let (start_time, end_time) = ClipWindow::around(center, offsets.start, offsets.end, duration);

        let mut session = decoder.open(path)?;
        let stream = session
            .video_stream()
            .ok_or_else(|| MontageError::NoVideoStream {
                path: path.to_path_buf(),
            })?;

        let mut frames =
            Self::decode_window(session.as_mut(), &stream, codec, start_time, end_time, size)?;

        if frames.is_empty() {
            warn!(
                "No frames in [{:.2}s, {:.2}s] of {}, using a single keyframe",
                start_time,
                end_time,
                path.display()
            );
            let frame = Self::keyframe_near(session.as_mut(), &stream, center)?.ok_or_else(|| {
                MontageError::NoKeyframeFound {
                    path: PathBuf::from(path),
                    timestamp: center,
                }
            })?;
            frames.push(fit_thumbnail(codec, frame, size));
        }

        debug!(
            "Clip at {:.2}s: {} frames in [{:.2}s, {:.2}s]",
            center,
            frames.len(),
            start_time,
            end_time
        );

        Ok(VideoClip {
            start_time,
            end_time,
            frames,
            timestamp: center,
        })
    }

    /// Decode every frame whose presentation time lies in `[start, end]`
    fn decode_window(
        session: &mut dyn DecodeSession,
        stream: &StreamInfo,
        codec: &dyn ImageCodec,
        start: f64,
        end: f64,
        size: ThumbnailSize,
    ) -> MontageResult<Vec<RgbImage>> {
        session.seek(stream.index, stream.time_base.seconds_to_pts(start), true)?;
        let end_pts = stream.time_base.seconds_to_pts(end);

        let mut frames = Vec::new();
        while let Some(packet) = session.next_packet(stream.index)? {
            if packet.pts.is_some_and(|pts| pts > end_pts) {
                break;
            }

            for frame in packet.frames {
                let Some(pts) = frame.pts else {
                    continue;
                };
                let time = stream.time_base.pts_to_seconds(pts);
                if (start..=end).contains(&time) {
                    frames.push(fit_thumbnail(codec, frame.pixels.to_image()?, size));
                }
            }
        }
        Ok(frames)
    }

    fn keyframe_near(
        session: &mut dyn DecodeSession,
        stream: &StreamInfo,
        center: f64,
    ) -> MontageResult<Option<RgbImage>> {
        session.seek(stream.index, stream.time_base.seconds_to_pts(center), true)?;
        while let Some(packet) = session.next_packet(stream.index)? {
            if let Some(frame) = packet.frames.into_iter().find(|frame| frame.key_frame) {
                return frame.pixels.to_image().map(Some);
            }
        }
        Ok(None)
    }
}
