// Image codec adapter - resize, quantize and encode with the image, jpeg-encoder and gif crates

use image::{imageops, imageops::FilterType, RgbImage};

use crate::error::{MontageError, MontageResult};
use crate::ports::ImageCodec;

mod median_cut;

pub use median_cut::MedianCutPalette;

/// NeuQuant sampling factor when `optimize` is set (1 = best quality)
const GIF_SPEED_OPTIMIZED: i32 = 1;
const GIF_SPEED_FAST: i32 = 10;

/// `ImageCodec` backed by the `image` and `gif` crates
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self
    }

    fn gif_error(message: impl std::fmt::Display) -> MontageError {
        MontageError::Encoding {
            format: "GIF",
            message: message.to_string(),
        }
    }
}

impl ImageCodec for ImageCrateCodec {
    fn resize(&self, image: &RgbImage, width: u32, height: u32, filter: FilterType) -> RgbImage {
        imageops::resize(image, width, height, filter)
    }

    fn encode_jpeg(&self, image: &RgbImage, quality: u8) -> MontageResult<Vec<u8>> {
        let jpeg_error = |message: String| MontageError::Encoding {
            format: "JPEG",
            message,
        };
        let width = u16::try_from(image.width())
            .map_err(|_| jpeg_error(format!("width {} exceeds 65535", image.width())))?;
        let height = u16::try_from(image.height())
            .map_err(|_| jpeg_error(format!("height {} exceeds 65535", image.height())))?;

        let mut bytes = Vec::new();
        let mut encoder = jpeg_encoder::Encoder::new(&mut bytes, quality.clamp(1, 100));
        encoder.set_progressive(false);
        encoder.set_optimized_huffman_tables(true);
        encoder
            .encode(image.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
            .map_err(|e| jpeg_error(e.to_string()))?;
        Ok(bytes)
    }

    fn encode_gif(
        &self,
        frames: &[RgbImage],
        delay_ms: u32,
        loop_count: u16,
        optimize: bool,
    ) -> MontageResult<Vec<u8>> {
        let first = frames
            .first()
            .ok_or_else(|| Self::gif_error("no frames to encode"))?;
        let width = u16::try_from(first.width())
            .map_err(|_| Self::gif_error(format!("width {} exceeds the GIF limit", first.width())))?;
        let height = u16::try_from(first.height())
            .map_err(|_| Self::gif_error(format!("height {} exceeds the GIF limit", first.height())))?;

        let repeat = if loop_count == 0 {
            gif::Repeat::Infinite
        } else {
            gif::Repeat::Finite(loop_count)
        };
        let speed = if optimize {
            GIF_SPEED_OPTIMIZED
        } else {
            GIF_SPEED_FAST
        };
        // GIF delays are in hundredths of a second
        let delay = u16::try_from(delay_ms / 10).unwrap_or(u16::MAX);

        let mut bytes = Vec::new();
        {
            let mut encoder =
                gif::Encoder::new(&mut bytes, width, height, &[]).map_err(Self::gif_error)?;
            encoder.set_repeat(repeat).map_err(Self::gif_error)?;

            for image in frames {
                if image.dimensions() != first.dimensions() {
                    return Err(Self::gif_error(format!(
                        "frame is {}x{}, expected {}x{}",
                        image.width(),
                        image.height(),
                        width,
                        height
                    )));
                }
                let mut frame = gif::Frame::from_rgb_speed(width, height, image.as_raw(), speed);
                frame.delay = delay;
                encoder.write_frame(&frame).map_err(Self::gif_error)?;
            }
        }
        Ok(bytes)
    }

    fn quantize(&self, image: &RgbImage, colors: u16, dither: bool) -> RgbImage {
        let palette = MedianCutPalette::build(image, usize::from(colors));
        let mut output = image.clone();
        if dither {
            imageops::dither(&mut output, &palette);
        } else {
            for pixel in output.pixels_mut() {
                imageops::ColorMap::map_color(&palette, pixel);
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use std::collections::HashSet;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn test_resize_exact_dimensions() {
        let codec = ImageCrateCodec::new();
        let out = codec.resize(&gradient(64, 48), 20, 10, FilterType::Triangle);
        assert_eq!(out.dimensions(), (20, 10));
    }

    #[test]
    fn test_jpeg_roundtrip_dimensions() {
        let codec = ImageCrateCodec::new();
        let bytes = codec.encode_jpeg(&gradient(33, 17), 85).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (33, 17));
    }

    #[test]
    fn test_jpeg_is_baseline_with_optimized_tables() {
        let codec = ImageCrateCodec::new();
        let image = gradient(64, 48);
        let bytes = codec.encode_jpeg(&image, 85).unwrap();

        // SOF0 (baseline) present, SOF2 (progressive) absent
        assert!(bytes.windows(2).any(|w| w == [0xFF, 0xC0]));
        assert!(!bytes.windows(2).any(|w| w == [0xFF, 0xC2]));

        let mut standard = Vec::new();
        jpeg_encoder::Encoder::new(&mut standard, 85)
            .encode(image.as_raw(), 64, 48, jpeg_encoder::ColorType::Rgb)
            .unwrap();
        assert!(bytes.len() <= standard.len());
    }

    #[test]
    fn test_jpeg_rejects_oversized_canvas() {
        let codec = ImageCrateCodec::new();
        assert!(matches!(
            codec.encode_jpeg(&RgbImage::new(70_000, 1), 85),
            Err(MontageError::Encoding { format: "JPEG", .. })
        ));
    }

    #[test]
    fn test_gif_frames_and_loop() {
        let codec = ImageCrateCodec::new();
        let frames = vec![gradient(16, 8), RgbImage::new(16, 8), gradient(16, 8)];
        let bytes = codec.encode_gif(&frames, 100, 0, false).unwrap();

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(bytes.as_slice()).unwrap();
        let mut count = 0;
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            assert_eq!(frame.delay, 10);
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn test_gif_rejects_mismatched_frames() {
        let codec = ImageCrateCodec::new();
        let frames = vec![RgbImage::new(4, 4), RgbImage::new(5, 4)];
        assert!(matches!(
            codec.encode_gif(&frames, 100, 1, true),
            Err(MontageError::Encoding { format: "GIF", .. })
        ));
        assert!(codec.encode_gif(&[], 100, 0, true).is_err());
    }

    #[test]
    fn test_quantize_limits_palette() {
        let codec = ImageCrateCodec::new();
        for dither in [false, true] {
            let out = codec.quantize(&gradient(64, 64), 8, dither);
            let distinct: HashSet<[u8; 3]> = out.pixels().map(|p| p.0).collect();
            assert!(distinct.len() <= 8, "got {} colours", distinct.len());
            assert_eq!(out.dimensions(), (64, 64));
        }
    }
}
