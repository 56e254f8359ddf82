//! Montage composition: canvas, header, cells, labels and encoding

use std::path::Path;
use std::sync::Arc;

use image::{imageops, imageops::FilterType, DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use tracing::{debug, info, warn};

use crate::domain::model::*;
use crate::error::{MontageError, MontageResult};
use crate::ports::ImageCodec;
use crate::render::fonts::FontCache;
use crate::render::gif_frames::GifFrameProcessor;
use crate::render::layout::{CellRect, GridLayout};
use crate::utils::{format_bitrate, format_duration, format_file_size, parse_color};

const HEADER_FONT_SIZE: u32 = 40;
const HEADER_MIN_FONT_SIZE: u32 = 10;
const META_FONT_SIZE: u32 = 20;
const LABEL_FONT_SIZE: u32 = 18;
const TITLE_CENTER_Y: i32 = 30;
const META_CENTER_Y: [i32; 2] = [80, 105];
const LABEL_INSET_X: i32 = 10;
const LABEL_INSET_BOTTOM: i32 = 8;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Colours and spacing of a montage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MontageStyle {
    pub font_color: Rgb<u8>,
    pub shadow_color: Rgb<u8>,
    pub background: Rgb<u8>,
    pub padding: u32,
    pub margin: u32,
    pub header_height: u32,
    pub show_full_path: bool,
}

impl MontageStyle {
    pub fn from_config(config: &Config) -> MontageResult<Self> {
        Ok(Self {
            font_color: parse_color(&config.font_color)?,
            shadow_color: parse_color(&config.shadow_color)?,
            background: parse_color(&config.background_color)?,
            padding: config.padding,
            margin: config.margin,
            header_height: config.header_height,
            show_full_path: config.show_full_path,
        })
    }
}

/// Renders and encodes one montage.
///
/// Owns the font cache for the duration of the run.
pub struct MontageComposer {
    codec: Arc<dyn ImageCodec>,
    style: MontageStyle,
    layout: GridLayout,
    thumb: ThumbnailSize,
    fonts: Option<FontCache>,
}

impl MontageComposer {
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        style: MontageStyle,
        layout: GridLayout,
        thumb: ThumbnailSize,
        fonts: Option<FontCache>,
    ) -> Self {
        Self {
            codec,
            style,
            layout,
            thumb,
            fonts,
        }
    }

    /// Build a composer from configuration, loading the font if one is set
    pub fn from_config(
        codec: Arc<dyn ImageCodec>,
        config: &Config,
        grid: GridSize,
        thumb: ThumbnailSize,
    ) -> MontageResult<Self> {
        let style = MontageStyle::from_config(config)?;
        let layout = GridLayout::from_specs(grid, &config.layout)?;
        let fonts = match &config.font_file {
            Some(path) => match FontCache::load(path) {
                Ok(fonts) => Some(fonts),
                Err(e) => {
                    warn!("Text rendering disabled: {}", e);
                    None
                }
            },
            None => None,
        };
        let composer = Self::new(codec, style, layout, thumb, fonts);
        composer.canvas_size()?;
        Ok(composer)
    }

    /// Canvas width and height.
    ///
    /// Fails with `InvalidRange` when the grid does not fit in a single image buffer.
    pub fn canvas_size(&self) -> MontageResult<(u32, u32)> {
        let s = &self.style;
        let width = Self::axis_length(self.layout.cols(), self.thumb.width, s.padding, s.margin, 0);
        let height = Self::axis_length(
            self.layout.rows(),
            self.thumb.height,
            s.padding,
            s.margin,
            s.header_height,
        );
        let fits = |w: u32, h: u32| {
            usize::try_from(w)
                .ok()
                .zip(usize::try_from(h).ok())
                .and_then(|(w, h)| w.checked_mul(h))
                .and_then(|pixels| pixels.checked_mul(4))
                .is_some()
        };
        match (width, height) {
            (Some(width), Some(height)) if fits(width, height) => Ok((width, height)),
            _ => Err(MontageError::invalid_range(format!(
                "montage canvas is too large: {}x{} cells of {}x{} with padding {} and margin {}",
                self.layout.cols(),
                self.layout.rows(),
                self.thumb.width,
                self.thumb.height,
                s.padding,
                s.margin
            ))),
        }
    }

    /// `count` cells of `cell` pixels separated by `padding`, plus both margins and `extra`
    fn axis_length(count: u32, cell: u32, padding: u32, margin: u32, extra: u32) -> Option<u32> {
        let count = count.max(1);
        count
            .checked_mul(cell)?
            .checked_add((count - 1).checked_mul(padding)?)?
            .checked_add(margin.checked_mul(2)?)?
            .checked_add(extra)
    }

    /// Render a static montage
    pub fn render_still(&mut self, info: &VideoInfo, frames: &[ExtractedFrame]) -> MontageResult<RgbImage> {
        let mut canvas = self.background_with_header(info)?;

        for frame in frames {
            let Some(rect) = self.cell_rect(frame.index) else {
                debug!("No layout cell for frame {}, skipping", frame.index);
                continue;
            };
            self.paste(&mut canvas, &frame.image, rect);
            if let Some(fonts) = self.fonts.as_mut() {
                Self::draw_label(fonts, &mut canvas, rect, frame.timestamp, WHITE, self.style.shadow_color);
            }
        }

        Ok(canvas)
    }

    /// Render and encode a static montage as JPEG
    pub fn compose_jpeg(&mut self, info: &VideoInfo, frames: &[ExtractedFrame], quality: u8) -> MontageResult<Vec<u8>> {
        let canvas = self.render_still(info, frames)?;
        info!(
            "Encoding {}x{} JPEG (quality {})",
            canvas.width(),
            canvas.height(),
            quality
        );
        self.codec.encode_jpeg(&canvas, quality)
    }

    /// Render every frame of an animated montage.
    ///
    /// Clips are truncated to the shortest one first.
    pub fn render_animation(
        &mut self,
        info: &VideoInfo,
        clips: &mut [GifClipResult],
    ) -> MontageResult<Vec<RgbImage>> {
        let frame_count = GifFrameProcessor::synchronize(clips)?;
        let base = self.background_with_header(info)?;
        let overlay = self.label_overlay(clips)?;

        let placed: Vec<(CellRect, &GifClipResult)> = clips
            .iter()
            .enumerate()
            .filter_map(|(index, clip)| match self.cell_rect(index) {
                Some(rect) => Some((rect, clip)),
                None => {
                    debug!("No layout cell for clip {}, skipping", index);
                    None
                }
            })
            .collect();

        let mut frames = Vec::with_capacity(frame_count);
        for frame_index in 0..frame_count {
            let mut canvas = base.clone();
            for (rect, clip) in &placed {
                self.paste(&mut canvas, &clip.frames[frame_index], *rect);
            }
            frames.push(match &overlay {
                Some(overlay) => Self::apply_overlay(canvas, overlay),
                None => canvas,
            });
        }
        Ok(frames)
    }

    /// Render and encode an animated montage as GIF
    pub fn compose_gif(
        &mut self,
        info: &VideoInfo,
        mut clips: Vec<GifClipResult>,
        optimize: bool,
    ) -> MontageResult<Vec<u8>> {
        let frames = self.render_animation(info, &mut clips)?;
        let (delay_ms, loop_count) = clips
            .first()
            .map(|clip| (clip.frame_duration_ms, clip.loop_count))
            .unwrap_or((100, 0));

        info!(
            "Encoding {} GIF frames ({} ms per frame, loop {})",
            frames.len(),
            delay_ms,
            loop_count
        );
        self.codec.encode_gif(&frames, delay_ms, loop_count, optimize)
    }

    fn cell_rect(&self, index: usize) -> Option<CellRect> {
        let cell = self.layout.cell_for(index)?;
        Some(self.layout.rect(
            &cell,
            self.thumb,
            self.style.padding,
            self.style.margin,
            self.style.header_height,
        ))
    }

    fn paste(&self, canvas: &mut RgbImage, image: &RgbImage, rect: CellRect) {
        if image.width() == rect.width && image.height() == rect.height {
            imageops::replace(canvas, image, i64::from(rect.x), i64::from(rect.y));
        } else {
            let resized = self
                .codec
                .resize(image, rect.width, rect.height, FilterType::Lanczos3);
            imageops::replace(canvas, &resized, i64::from(rect.x), i64::from(rect.y));
        }
    }

    fn background_with_header(&mut self, info: &VideoInfo) -> MontageResult<RgbImage> {
        let (width, height) = self.canvas_size()?;
        let mut canvas = RgbImage::from_pixel(width, height, self.style.background);
        if let Some(fonts) = self.fonts.as_mut() {
            Self::draw_header(fonts, &mut canvas, &self.style, info);
        }
        Ok(canvas)
    }

    fn draw_header(fonts: &mut FontCache, canvas: &mut RgbImage, style: &MontageStyle, info: &VideoInfo) {
        let width = canvas.width();
        let title = display_name(&info.path, style.show_full_path);

        let limit = f64::from(width) * 0.9;
        let mut size = HEADER_FONT_SIZE;
        while size > HEADER_MIN_FONT_SIZE && f64::from(fonts.measure(size, &title).0) >= limit {
            size -= 2;
        }
        let size = size.max(HEADER_MIN_FONT_SIZE);

        Self::draw_centered(fonts, canvas, &title, size, TITLE_CENTER_Y, 2, style.font_color, style.shadow_color);

        let lines = [metadata_line1(info), metadata_line2(info)];
        for (line, center_y) in lines.iter().zip(META_CENTER_Y) {
            Self::draw_centered(fonts, canvas, line, META_FONT_SIZE, center_y, 1, WHITE, style.shadow_color);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_centered(
        fonts: &mut FontCache,
        canvas: &mut RgbImage,
        text: &str,
        size: u32,
        center_y: i32,
        shadow_offset: i32,
        color: Rgb<u8>,
        shadow: Rgb<u8>,
    ) {
        let (text_w, text_h) = fonts.measure(size, text);
        let x = canvas.width() as i32 / 2 - text_w as i32 / 2;
        let y = center_y - text_h as i32 / 2;
        fonts.draw(canvas, shadow, x + shadow_offset, y + shadow_offset, size, text);
        fonts.draw(canvas, color, x, y, size, text);
    }

    fn draw_label<C>(
        fonts: &mut FontCache,
        canvas: &mut C,
        rect: CellRect,
        timestamp: f64,
        color: C::Pixel,
        shadow: C::Pixel,
    ) where
        C: imageproc::drawing::Canvas,
        <C::Pixel as image::Pixel>::Subpixel: Into<f32> + imageproc::definitions::Clamp<f32>,
    {
        let text = format_duration(timestamp);
        let (_, text_h) = fonts.measure(LABEL_FONT_SIZE, &text);
        let x = rect.x as i32 + LABEL_INSET_X;
        let y = (rect.y + rect.height) as i32 - text_h as i32 - LABEL_INSET_BOTTOM;
        fonts.draw(canvas, shadow, x + 1, y + 1, LABEL_FONT_SIZE, &text);
        fonts.draw(canvas, color, x, y, LABEL_FONT_SIZE, &text);
    }

    /// Transparent layer holding every timestamp label, drawn once per animation
    fn label_overlay(&mut self, clips: &[GifClipResult]) -> MontageResult<Option<RgbaImage>> {
        if self.fonts.is_none() {
            return Ok(None);
        }
        let (width, height) = self.canvas_size()?;
        let mut overlay = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        let shadow = self.style.shadow_color.0;
        let shadow = Rgba([shadow[0], shadow[1], shadow[2], 255]);
        let white = Rgba([255, 255, 255, 255]);

        for (index, clip) in clips.iter().enumerate() {
            let Some(rect) = self.cell_rect(index) else {
                continue;
            };
            if let Some(fonts) = self.fonts.as_mut() {
                Self::draw_label(fonts, &mut overlay, rect, clip.timestamp, white, shadow);
            }
        }
        Ok(Some(overlay))
    }

    fn apply_overlay(canvas: RgbImage, overlay: &RgbaImage) -> RgbImage {
        let mut frame = DynamicImage::ImageRgb8(canvas).into_rgba8();
        imageops::overlay(&mut frame, overlay, 0, 0);
        DynamicImage::ImageRgba8(frame).into_rgb8()
    }
}

/// Title shown in the header: file name, or the absolute path when requested
pub fn display_name(path: &Path, full_path: bool) -> String {
    if full_path {
        return crate::output::naming::absolutize(path).display().to_string();
    }
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `WxH | 29.97 FPS | 5.00 Mbps`
pub fn metadata_line1(info: &VideoInfo) -> String {
    let fps = match info.fps() {
        Some(fps) => format!("{:.2} FPS", fps),
        None => "N/A FPS".to_string(),
    };
    format!(
        "{}x{} | {} | {}",
        info.width,
        info.height,
        fps,
        format_bitrate(info.bit_rate)
    )
}

/// `HH:MM:SS | 12.34 MB | H264 / AAC`
pub fn metadata_line2(info: &VideoInfo) -> String {
    let mut codecs = info.video_codec.to_uppercase();
    if !info.audio_codec.is_empty() {
        codecs.push_str(" / ");
        codecs.push_str(&info.audio_codec.to_uppercase());
    }
    format!(
        "{} | {} | {}",
        format_duration(info.duration),
        format_file_size(info.file_size),
        codecs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::image_codec::ImageCrateCodec;
    use crate::error::MontageError;
    use std::path::PathBuf;

    fn info() -> VideoInfo {
        VideoInfo {
            path: PathBuf::from("/videos/holiday.mp4"),
            duration: 5025.0,
            width: 1920,
            height: 1080,
            file_size: 12_940_000,
            video_codec: "h264".into(),
            audio_codec: "aac".into(),
            bit_rate: 5_000_000,
            avg_frame_rate: Rational::new(30000, 1001),
        }
    }

    fn style(padding: u32, margin: u32, header_height: u32) -> MontageStyle {
        MontageStyle {
            font_color: WHITE,
            shadow_color: Rgb([0, 0, 0]),
            background: Rgb([0x22, 0x22, 0x22]),
            padding,
            margin,
            header_height,
            show_full_path: false,
        }
    }

    fn composer(grid: GridSize, style: MontageStyle, thumb: ThumbnailSize) -> MontageComposer {
        MontageComposer::new(
            Arc::new(ImageCrateCodec::new()),
            style,
            GridLayout::new(grid),
            thumb,
            None,
        )
    }

    fn frame(index: usize, color: [u8; 3], thumb: ThumbnailSize) -> ExtractedFrame {
        ExtractedFrame {
            index,
            image: RgbImage::from_pixel(thumb.width, thumb.height, Rgb(color)),
            timestamp: index as f64,
        }
    }

    #[test]
    fn test_single_cell_canvas_matches_thumbnail_plus_header() {
        let thumb = ThumbnailSize { width: 64, height: 36 };
        let mut composer = composer(GridSize::new(1, 1), style(0, 0, 120), thumb);
        assert_eq!(composer.canvas_size().unwrap(), (64, 156));

        let canvas = composer
            .render_still(&info(), &[frame(0, [200, 10, 10], thumb)])
            .unwrap();
        assert_eq!(canvas.dimensions(), (64, 156));
        assert_eq!(canvas.get_pixel(0, 120), &Rgb([200, 10, 10]));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([0x22, 0x22, 0x22]));
    }

    #[test]
    fn test_canvas_size_formula() {
        let thumb = ThumbnailSize { width: 640, height: 360 };
        let composer = composer(GridSize::new(4, 5), style(5, 20, 120), thumb);
        assert_eq!(
            composer.canvas_size().unwrap(),
            (4 * 640 + 3 * 5 + 40, 5 * 360 + 4 * 5 + 40 + 120)
        );
    }

    #[test]
    fn test_oversized_canvas_rejected() {
        let thumb = ThumbnailSize { width: u32::MAX / 2, height: 10 };
        let composer = composer(GridSize::new(3, 1), style(5, 20, 120), thumb);
        assert!(matches!(
            composer.canvas_size(),
            Err(MontageError::InvalidRange { .. })
        ));

        let config = Config {
            columns: 3,
            rows: 1,
            ..Config::default()
        };
        let result = MontageComposer::from_config(
            Arc::new(ImageCrateCodec::new()),
            &config,
            GridSize::new(3, 1),
            thumb,
        );
        assert!(matches!(result, Err(MontageError::InvalidRange { .. })));
    }

    #[test]
    fn test_frames_land_in_index_order() {
        let thumb = ThumbnailSize { width: 10, height: 10 };
        let mut composer = composer(GridSize::new(2, 2), style(2, 3, 0), thumb);
        let frames: Vec<_> = (0..4)
            .map(|i| frame(i, [i as u8 * 50, 0, 0], thumb))
            .collect();

        let canvas = composer.render_still(&info(), &frames).unwrap();
        assert_eq!(canvas.get_pixel(3, 3), &Rgb([0, 0, 0]));
        assert_eq!(canvas.get_pixel(15, 3), &Rgb([50, 0, 0]));
        assert_eq!(canvas.get_pixel(3, 15), &Rgb([100, 0, 0]));
        assert_eq!(canvas.get_pixel(15, 15), &Rgb([150, 0, 0]));
        // padding keeps the background
        assert_eq!(canvas.get_pixel(13, 3), &Rgb([0x22, 0x22, 0x22]));
    }

    #[test]
    fn test_spanned_cell_is_resized() {
        let thumb = ThumbnailSize { width: 10, height: 10 };
        let mut layout = GridLayout::new(GridSize::new(2, 2));
        layout.add_cell(0, 0, 2, 2, None).unwrap();
        let mut composer = MontageComposer::new(
            Arc::new(ImageCrateCodec::new()),
            style(2, 0, 0),
            layout,
            thumb,
            None,
        );

        let canvas = composer
            .render_still(&info(), &[frame(0, [9, 99, 199], thumb), frame(1, [1, 1, 1], thumb)])
            .unwrap();
        assert_eq!(canvas.dimensions(), (22, 22));
        assert_eq!(canvas.get_pixel(21, 21), &Rgb([9, 99, 199]));
    }

    #[test]
    fn test_layout_out_of_bounds_from_config() {
        let config = Config {
            layout: vec![GridCellSpec { row: 0, col: 3, row_span: 1, col_span: 2, index: None }],
            ..Config::default()
        };
        let err = MontageComposer::from_config(
            Arc::new(ImageCrateCodec::new()),
            &config,
            GridSize::new(4, 5),
            ThumbnailSize { width: 8, height: 8 },
        )
        .err()
        .unwrap();
        assert!(matches!(err, MontageError::OutOfBounds { .. }));
    }

    #[test]
    fn test_animation_uses_shortest_clip() {
        let thumb = ThumbnailSize { width: 4, height: 4 };
        let mut composer = composer(GridSize::new(2, 1), style(0, 0, 0), thumb);
        let clip = |n: usize, shade: u8| GifClipResult {
            frames: (0..n)
                .map(|i| RgbImage::from_pixel(4, 4, Rgb([shade, i as u8, 0])))
                .collect(),
            frame_duration_ms: 100,
            loop_count: 0,
            timestamp: shade as f64,
        };
        let mut clips = vec![clip(5, 10), clip(3, 20)];

        let frames = composer.render_animation(&info(), &mut clips).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].get_pixel(0, 0), &Rgb([10, 2, 0]));
        assert_eq!(frames[2].get_pixel(5, 0), &Rgb([20, 2, 0]));
    }

    #[test]
    fn test_compose_outputs_decodable_images() {
        let thumb = ThumbnailSize { width: 8, height: 8 };
        let mut composer = composer(GridSize::new(1, 1), style(0, 0, 4), thumb);
        let jpeg = composer
            .compose_jpeg(&info(), &[frame(0, [255, 0, 0], thumb)], 85)
            .unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let clips = vec![GifClipResult {
            frames: vec![RgbImage::new(8, 8), RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]))],
            frame_duration_ms: 100,
            loop_count: 0,
            timestamp: 1.0,
        }];
        let gif = composer.compose_gif(&info(), clips, true).unwrap();
        assert_eq!(&gif[..6], b"GIF89a");
    }

    #[test]
    fn test_metadata_lines() {
        assert_eq!(metadata_line1(&info()), "1920x1080 | 29.97 FPS | 5.00 Mbps");
        assert_eq!(metadata_line2(&info()), "01:23:45 | 12.34 MB | H264 / AAC");

        let silent = VideoInfo {
            audio_codec: String::new(),
            avg_frame_rate: Rational::new(0, 0),
            ..info()
        };
        assert_eq!(metadata_line1(&silent), "1920x1080 | N/A FPS | 5.00 Mbps");
        assert!(metadata_line2(&silent).ends_with("| H264"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/videos/holiday.mp4"), false), "holiday.mp4");
        assert!(display_name(Path::new("relative/clip.mkv"), true).starts_with('/'));
    }
}
