//! Frame resampling, colour reduction and clip synchronisation for GIF output

use std::sync::Arc;

use image::imageops::FilterType;
use tracing::debug;

use crate::domain::model::*;
use crate::error::{MontageError, MontageResult};
use crate::ports::ImageCodec;

/// Turns extracted clips into animation-ready frame lists
pub struct GifFrameProcessor {
    codec: Arc<dyn ImageCodec>,
    fps: u32,
    colors: u16,
    dither: bool,
    loop_count: u16,
}

impl GifFrameProcessor {
    pub fn new(codec: Arc<dyn ImageCodec>, fps: u32, colors: u16, dither: bool, loop_count: u16) -> Self {
        Self {
            codec,
            fps: fps.max(1),
            colors,
            dither,
            loop_count,
        }
    }

    pub fn from_config(codec: Arc<dyn ImageCodec>, config: &Config) -> Self {
        Self::new(
            codec,
            config.gif_fps,
            config.gif_colors,
            config.gif_dither,
            config.gif_loop,
        )
    }

    /// Inter-frame delay in milliseconds
    pub fn frame_duration_ms(&self) -> u32 {
        1000 / self.fps
    }

    /// Number of frames a clip of `duration` seconds should have at `fps`
    pub fn target_frame_count(duration: f64, fps: u32) -> usize {
        let target = (duration * fps as f64).round();
        if target.is_finite() && target >= 1.0 {
            target as usize
        } else {
            1
        }
    }

    /// Source indices kept when reducing `frame_count` frames to `target`.
    ///
    /// Frames are picked at `floor(i * frame_count / target)`, never synthesized.
    pub fn resample_indices(frame_count: usize, target: usize) -> Vec<usize> {
        if frame_count <= target {
            return (0..frame_count).collect();
        }
        let target = target.max(1);
        let step = frame_count as f64 / target as f64;
        (0..target)
            .map(|i| ((i as f64 * step) as usize).min(frame_count - 1))
            .collect()
    }

    /// Resample, resize and quantize one clip
    pub fn process(&self, clip: VideoClip, size: ThumbnailSize) -> MontageResult<GifClipResult> {
        if clip.frames.is_empty() {
            return Err(MontageError::invalid_range(format!(
                "clip at {:.2}s has no frames",
                clip.timestamp
            )));
        }

        let target = Self::target_frame_count(clip.duration(), self.fps);
        let indices = Self::resample_indices(clip.frame_count(), target);
        debug!(
            "Clip at {:.2}s: {} source frames, keeping {}",
            clip.timestamp,
            clip.frame_count(),
            indices.len()
        );

        let frames = indices
            .into_iter()
            .map(|index| {
                let frame = &clip.frames[index];
                let frame = if frame.width() != size.width || frame.height() != size.height {
                    self.codec
                        .resize(frame, size.width, size.height, FilterType::Lanczos3)
                } else {
                    frame.clone()
                };
                if self.colors < 256 {
                    self.codec.quantize(&frame, self.colors, self.dither)
                } else {
                    frame
                }
            })
            .collect();

        Ok(GifClipResult {
            frames,
            frame_duration_ms: self.frame_duration_ms(),
            loop_count: self.loop_count,
            timestamp: clip.timestamp,
        })
    }

    /// Truncate every clip to the shortest frame list; returns the common length
    pub fn synchronize(clips: &mut [GifClipResult]) -> MontageResult<usize> {
        let shortest = clips
            .iter()
            .map(|clip| clip.frames.len())
            .min()
            .unwrap_or(0);

        if shortest == 0 {
            return Err(MontageError::invalid_range("no frames to animate"));
        }

        for clip in clips.iter_mut() {
            clip.frames.truncate(shortest);
        }
        debug!("Synchronised {} clips to {} frames", clips.len(), shortest);
        Ok(shortest)
    }
}
