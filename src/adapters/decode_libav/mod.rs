// Decode LibAV adapter - Demuxing, seeking and frame decoding using libav

use std::path::{Path, PathBuf};

use ffmpeg_next::codec::decoder;
use ffmpeg_next::format::{context::Input, Pixel};
use ffmpeg_next::media::Type;
use ffmpeg_next::software::scaling::{self, Flags};
use ffmpeg_next::util::frame::video::Video;
use ffmpeg_next::Packet;
use image::RgbImage;
use tracing::{debug, trace};

use crate::domain::model::Rational;
use crate::error::{MontageError, MontageResult};
use crate::ports::{DecodeSession, DecodedFrame, DecodedPacket, FramePixels, MediaDecoder, StreamInfo, StreamKind};

const AV_TIME_BASE: i64 = ffmpeg_next::ffi::AV_TIME_BASE as i64;

/// LibAV-based decoder: every `open` returns an independent session
#[derive(Debug, Clone, Copy)]
pub struct LibavDecoder;

impl LibavDecoder {
    /// Create a new decoder, initializing libav once per process
    pub fn new() -> MontageResult<Self> {
        super::init_libav()?;
        Ok(Self)
    }
}

impl MediaDecoder for LibavDecoder {
    fn open(&self, path: &Path) -> MontageResult<Box<dyn DecodeSession>> {
        Ok(Box::new(LibavSession::open(path)?))
    }
}

/// Decoded frame still in its native pixel format
struct LibavFrame {
    frame: Video,
    path: PathBuf,
}

impl FramePixels for LibavFrame {
    fn to_image(&self) -> MontageResult<RgbImage> {
        let (width, height) = (self.frame.width(), self.frame.height());
        let mut scaler = scaling::Context::get(
            self.frame.format(),
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            Flags::BILINEAR,
        )
        .map_err(|e| MontageError::decode(&self.path, format!("Failed to create scaler: {}", e)))?;

        let mut rgb = Video::empty();
        scaler
            .run(&self.frame, &mut rgb)
            .map_err(|e| MontageError::decode(&self.path, format!("Failed to convert frame: {}", e)))?;

        // Rows may be padded, copy line by line
        let stride = rgb.stride(0);
        let row_bytes = width as usize * 3;
        let data = rgb.data(0);
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            pixels.extend_from_slice(&data[start..start + row_bytes]);
        }

        RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
            MontageError::decode(&self.path, "RGB buffer does not match frame size")
        })
    }
}

/// An open input with a decoder bound to its video stream
pub struct LibavSession {
    path: PathBuf,
    input: Input,
    decoder: decoder::Video,
    video_index: usize,
    streams: Vec<StreamInfo>,
    drained: bool,
}

impl LibavSession {
    /// Open `path` and prepare a decoder for its best video stream
    pub fn open(path: &Path) -> MontageResult<Self> {
        let input = ffmpeg_next::format::input(path)
            .map_err(|e| MontageError::decode(path, format!("Failed to open input: {}", e)))?;

        let streams: Vec<StreamInfo> = input.streams().map(|stream| stream_info(&stream)).collect();

        let video = input
            .streams()
            .best(Type::Video)
            .ok_or_else(|| MontageError::NoVideoStream {
                path: path.to_path_buf(),
            })?;
        let video_index = video.index();

        let decoder = ffmpeg_next::codec::context::Context::from_parameters(video.parameters())
            .map_err(|e| MontageError::decode(path, format!("Failed to create decoder context: {}", e)))?
            .decoder()
            .video()
            .map_err(|e| MontageError::decode(path, format!("Failed to create video decoder: {}", e)))?;

        debug!(
            "Opened {} (video stream {}, {}x{})",
            path.display(),
            video_index,
            decoder.width(),
            decoder.height()
        );

        Ok(Self {
            path: path.to_path_buf(),
            input,
            decoder,
            video_index,
            streams,
            drained: false,
        })
    }

    fn receive_frames(&mut self) -> Vec<DecodedFrame> {
        let mut frames = Vec::new();
        loop {
            let mut frame = Video::empty();
            if self.decoder.receive_frame(&mut frame).is_err() {
                break;
            }
            frames.push(DecodedFrame {
                pts: frame.pts().or_else(|| frame.timestamp()),
                key_frame: frame.is_key(),
                pixels: Box::new(LibavFrame {
                    frame,
                    path: self.path.clone(),
                }),
            });
        }
        frames
    }
}

impl DecodeSession for LibavSession {
    fn streams(&self) -> Vec<StreamInfo> {
        self.streams.clone()
    }

    fn video_stream(&self) -> Option<StreamInfo> {
        self.streams
            .iter()
            .find(|stream| stream.index == self.video_index)
            .cloned()
    }

    fn seek(&mut self, stream_index: usize, pts: i64, backward: bool) -> MontageResult<()> {
        let time_base = self
            .streams
            .get(stream_index)
            .map(|stream| stream.time_base)
            .unwrap_or(Rational::new(1, AV_TIME_BASE as i32));

        // Container-level seeks are expressed in AV_TIME_BASE units
        let ts = (i128::from(pts) * i128::from(time_base.num) * i128::from(AV_TIME_BASE)
            / i128::from(time_base.den.max(1))) as i64;

        let result = if backward {
            self.input.seek(ts, ..ts).or_else(|e| {
                trace!("Bounded seek to {} failed ({}), retrying unbounded", ts, e);
                self.input.seek(ts, ..)
            })
        } else {
            self.input.seek(ts, ts..)
        };
        result.map_err(|e| MontageError::decode(&self.path, format!("Failed to seek: {}", e)))?;

        self.decoder.flush();
        self.drained = false;
        Ok(())
    }

    fn next_packet(&mut self, stream_index: usize) -> MontageResult<Option<DecodedPacket>> {
        if stream_index != self.video_index {
            return Err(MontageError::decode(
                &self.path,
                format!("Stream {} is not the decoded video stream", stream_index),
            ));
        }
        if self.drained {
            return Ok(None);
        }

        loop {
            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() != stream_index {
                        continue;
                    }
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        // Corrupt packets are skipped like the decoder would
                        trace!("Skipping undecodable packet in {}: {}", self.path.display(), e);
                        return Ok(Some(DecodedPacket {
                            pts: packet.pts(),
                            frames: Vec::new(),
                        }));
                    }
                    let frames = self.receive_frames();
                    return Ok(Some(DecodedPacket {
                        pts: packet.pts(),
                        frames,
                    }));
                }
                Err(ffmpeg_next::Error::Eof) => {
                    // Flush frames buffered by the decoder as a final pseudo-packet
                    self.drained = true;
                    let _ = self.decoder.send_eof();
                    let frames = self.receive_frames();
                    if frames.is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(DecodedPacket { pts: None, frames }));
                }
                Err(e) => {
                    return Err(MontageError::decode(
                        &self.path,
                        format!("Failed to read packet: {}", e),
                    ));
                }
            }
        }
    }
}

fn stream_info(stream: &ffmpeg_next::format::stream::Stream) -> StreamInfo {
    let parameters = stream.parameters();
    let kind = match parameters.medium() {
        Type::Video => StreamKind::Video,
        Type::Audio => StreamKind::Audio,
        Type::Subtitle => StreamKind::Subtitle,
        _ => StreamKind::Other,
    };
    let time_base = stream.time_base();
    let frame_rate = stream.avg_frame_rate();

    let (width, height) = if kind == StreamKind::Video {
        ffmpeg_next::codec::context::Context::from_parameters(parameters.clone())
            .and_then(|ctx| ctx.decoder().video())
            .map(|video| (video.width(), video.height()))
            .unwrap_or((0, 0))
    } else {
        (0, 0)
    };

    StreamInfo {
        kind,
        index: stream.index(),
        time_base: Rational::new(time_base.numerator(), time_base.denominator()),
        codec_name: parameters.id().name().to_string(),
        width,
        height,
        avg_frame_rate: Rational::new(frame_rate.numerator(), frame_rate.denominator()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_error_names_the_file() {
        let frame = LibavFrame {
            frame: Video::empty(),
            path: PathBuf::from("/videos/holiday.mp4"),
        };
        let err = frame.to_image().unwrap_err();
        assert!(matches!(err, MontageError::Decode { .. }));
        assert!(err.to_string().contains("/videos/holiday.mp4"));
    }
}
