//! Still frame extraction for static montages

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::model::*;
use crate::engine::{fit_thumbnail, WorkerPool};
use crate::error::{MontageError, MontageResult};
use crate::planner::KeyframeLocator;
use crate::ports::{ImageCodec, MediaDecoder};

/// Extracts one keyframe per scheduled sample, in parallel
pub struct FrameExtractor {
    decoder: Arc<dyn MediaDecoder>,
    codec: Arc<dyn ImageCodec>,
    locator: KeyframeLocator,
    pool: WorkerPool,
}

impl FrameExtractor {
    /// Create an extractor running at most `max_workers` decode sessions at once
    pub fn new(decoder: Arc<dyn MediaDecoder>, codec: Arc<dyn ImageCodec>, max_workers: usize) -> Self {
        Self {
            decoder,
            codec,
            locator: KeyframeLocator::new(),
            pool: WorkerPool::new(max_workers),
        }
    }

    /// Use a custom keyframe locator
    pub fn with_locator(mut self, locator: KeyframeLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Extract every sample; the result is ordered by sample index
    pub async fn extract(
        &self,
        path: &Path,
        samples: &[ScheduledSample],
        size: ThumbnailSize,
    ) -> MontageResult<Vec<ExtractedFrame>> {
        if samples.is_empty() {
            return Err(MontageError::invalid_range("no samples to extract"));
        }

        info!(
            "Extracting {} frames from {} with {} workers",
            samples.len(),
            path.display(),
            self.pool.workers_for(samples.len())
        );

        let decoder = Arc::clone(&self.decoder);
        let codec = Arc::clone(&self.codec);
        let locator = self.locator.clone();
        let path: PathBuf = path.to_path_buf();

        self.pool
            .run(samples.to_vec(), move |sample| {
                Self::extract_one(
                    decoder.as_ref(),
                    codec.as_ref(),
                    &locator,
                    &path,
                    sample,
                    size,
                )
            })
            .await
    }

    /// Extract a single sample with its own decode session
    pub fn extract_one(
        decoder: &dyn MediaDecoder,
        codec: &dyn ImageCodec,
        locator: &KeyframeLocator,
        path: &Path,
        sample: ScheduledSample,
        size: ThumbnailSize,
    ) -> MontageResult<ExtractedFrame> {
        let mut session = decoder.open(path)?;
        let stream = session
            .video_stream()
            .ok_or_else(|| MontageError::NoVideoStream {
                path: path.to_path_buf(),
            })?;

        let located = locator.locate(session.as_mut(), &stream, path, sample.timestamp)?;
        debug!(
            "Frame {} requested at {:.2}s, got {:.2}s",
            sample.index, sample.timestamp, located.timestamp
        );

        Ok(ExtractedFrame {
            index: sample.index,
            image: fit_thumbnail(codec, located.image, size),
            timestamp: located.timestamp,
        })
    }
}
