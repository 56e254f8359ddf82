// Montage interactor - Orchestrates contact sheet generation for one video

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::model::*;
use crate::engine::clip_extractor::ClipOffsets;
use crate::engine::{ClipExtractor, FrameExtractor};
use crate::error::{MontageError, MontageResult};
use crate::output::{MontageWriter, OutputTarget};
use crate::planner::TimestampScheduler;
use crate::ports::*;
use crate::render::{GifFrameProcessor, MontageComposer};

/// Outcome of one montage run
#[derive(Debug, Clone, Serialize)]
pub struct MontageReport {
    pub input: PathBuf,
    pub output: String,
    pub format: OutputFormat,
    pub grid: GridSize,
    pub thumbnail: ThumbnailSize,
    pub samples: usize,
    pub bytes: usize,
}

/// Interactor for the montage use case
pub struct MontageInteractor {
    probe_port: Arc<dyn ProbePort>,
    decoder: Arc<dyn MediaDecoder>,
    codec: Arc<dyn ImageCodec>,
    output_port: Arc<dyn OutputPort>,
}

impl MontageInteractor {
    /// Create new montage interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        decoder: Arc<dyn MediaDecoder>,
        codec: Arc<dyn ImageCodec>,
        output_port: Arc<dyn OutputPort>,
    ) -> Self {
        Self {
            probe_port,
            decoder,
            codec,
            output_port,
        }
    }

    /// Generate the montage for `config.input_path` and write it to `target`.
    ///
    /// Configuration errors surface before the video is probed or decoded.
    pub async fn execute(&self, config: &Config, target: &OutputTarget) -> MontageResult<MontageReport> {
        config.validate()?;
        let scheduler = TimestampScheduler::from_config(config)?;

        let writer = MontageWriter::new(Arc::clone(&self.output_port), config.overwrite);
        writer.ensure_writable(target).await?;

        info!("Processing {}", config.input_path.display());
        let video = self.probe_port.probe(&config.input_path).await?;
        info!(
            "Video: {:.2}s, {}x{}, {}",
            video.duration, video.width, video.height, video.video_codec
        );

        let grid = TimestampScheduler::resolve_grid(config, video.duration)?;
        let thumbnail = ThumbnailSize::resolve(config.thumb_width, config.thumb_height, &video)?;
        let samples = scheduler.schedule(video.duration, grid.cell_count())?;
        info!(
            "Grid {} with {}x{} thumbnails, {} samples",
            grid,
            thumbnail.width,
            thumbnail.height,
            samples.len()
        );

        // Layout problems are configuration errors, catch them before decoding
        let composer = MontageComposer::from_config(Arc::clone(&self.codec), config, grid, thumbnail)?;
        let workers = config.effective_max_workers();

        let bytes = match config.output_format {
            OutputFormat::Jpg => {
                let frames = FrameExtractor::new(Arc::clone(&self.decoder), Arc::clone(&self.codec), workers)
                    .extract(&video.path, &samples, thumbnail)
                    .await?;
                let quality = config.jpeg_quality;
                let info = video.clone();
                Self::render(move || {
                    let mut composer = composer;
                    composer.compose_jpeg(&info, &frames, quality)
                })
                .await?
            }
            OutputFormat::Gif => {
                let clips = ClipExtractor::new(Arc::clone(&self.decoder), Arc::clone(&self.codec), workers)
                    .extract(&video, &samples, ClipOffsets::from_config(config), thumbnail)
                    .await?;
                let processor = GifFrameProcessor::from_config(Arc::clone(&self.codec), config);
                let optimize = config.gif_optimize;
                let info = video.clone();
                Self::render(move || {
                    let results = clips
                        .into_iter()
                        .map(|clip| processor.process(clip, thumbnail))
                        .collect::<MontageResult<Vec<_>>>()?;
                    let mut composer = composer;
                    composer.compose_gif(&info, results, optimize)
                })
                .await?
            }
        };

        writer.write(target, &bytes).await?;

        Ok(MontageReport {
            input: video.path.clone(),
            output: target.to_string(),
            format: config.output_format,
            grid,
            thumbnail,
            samples: samples.len(),
            bytes: bytes.len(),
        })
    }

    /// Run CPU-bound rendering off the async workers
    async fn render<F>(job: F) -> MontageResult<Vec<u8>>
    where
        F: FnOnce() -> MontageResult<Vec<u8>> + Send + 'static,
    {
        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| MontageError::Worker {
                message: e.to_string(),
            })?
    }
}
