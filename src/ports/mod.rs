// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;
use image::{imageops::FilterType, RgbImage};

use crate::domain::model::*;
use crate::error::MontageResult;

/// Port for reading video metadata
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a video file and return its metadata.
    ///
    /// Fails with `NoVideoStream` when the file has no video stream.
    async fn probe(&self, path: &Path) -> MontageResult<VideoInfo>;
}

/// Kind of elementary stream in a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Other,
}

/// Stream metadata exposed by a decode session
#[derive(Debug, Clone, PartialEq)]
pub struct StreamInfo {
    pub kind: StreamKind,
    pub index: usize,
    pub time_base: Rational,
    pub codec_name: String,
    pub width: u32,
    pub height: u32,
    pub avg_frame_rate: Rational,
}

/// Pixel data of a decoded frame, converted to RGB on demand
pub trait FramePixels {
    fn to_image(&self) -> MontageResult<RgbImage>;
}

impl FramePixels for RgbImage {
    fn to_image(&self) -> MontageResult<RgbImage> {
        Ok(self.clone())
    }
}

/// A decoded video frame
pub struct DecodedFrame {
    /// Presentation timestamp in stream time base units
    pub pts: Option<i64>,
    pub key_frame: bool,
    pub pixels: Box<dyn FramePixels>,
}

impl std::fmt::Debug for DecodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedFrame")
            .field("pts", &self.pts)
            .field("key_frame", &self.key_frame)
            .finish_non_exhaustive()
    }
}

/// One demuxed packet and the frames its decode produced
#[derive(Debug)]
pub struct DecodedPacket {
    pub pts: Option<i64>,
    pub frames: Vec<DecodedFrame>,
}

/// An open decode session.
///
/// A session holds demuxer and decoder state and is never shared: each
/// extraction task opens, uses and drops its own session on the thread it
/// runs on. Dropping the session closes it.
pub trait DecodeSession {
    /// All streams of the container
    fn streams(&self) -> Vec<StreamInfo>;

    /// First video stream, if any
    fn video_stream(&self) -> Option<StreamInfo> {
        self.streams()
            .into_iter()
            .find(|stream| stream.kind == StreamKind::Video)
    }

    /// Seek the stream to `pts` (stream time base). `backward` lands on the
    /// nearest keyframe at or before the position.
    fn seek(&mut self, stream_index: usize, pts: i64, backward: bool) -> MontageResult<()>;

    /// Demux and decode the next packet of `stream_index`. `None` at end of stream.
    fn next_packet(&mut self, stream_index: usize) -> MontageResult<Option<DecodedPacket>>;
}

/// Port for opening decode sessions
pub trait MediaDecoder: Send + Sync {
    fn open(&self, path: &Path) -> MontageResult<Box<dyn DecodeSession>>;
}

/// Port for image resize, quantization and encoding
pub trait ImageCodec: Send + Sync {
    /// Resize to exactly `width` x `height`
    fn resize(&self, image: &RgbImage, width: u32, height: u32, filter: FilterType) -> RgbImage;

    /// Encode a baseline JPEG
    fn encode_jpeg(&self, image: &RgbImage, quality: u8) -> MontageResult<Vec<u8>>;

    /// Encode an animated GIF
    fn encode_gif(
        &self,
        frames: &[RgbImage],
        delay_ms: u32,
        loop_count: u16,
        optimize: bool,
    ) -> MontageResult<Vec<u8>>;

    /// Reduce the palette to `colors` entries, returning a full colour image
    fn quantize(&self, image: &RgbImage, colors: u16, dither: bool) -> RgbImage;
}

/// Port for writing encoded montages
#[async_trait]
pub trait OutputPort: Send + Sync {
    /// Write `bytes` to `path`, creating parent directories
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> MontageResult<()>;

    /// Stream `bytes` to standard output
    async fn write_stdout(&self, bytes: &[u8]) -> MontageResult<()>;

    /// Whether `path` already exists
    async fn exists(&self, path: &Path) -> bool;
}
