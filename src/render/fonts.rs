//! Font loading and per-size text measurement cache

use std::collections::HashMap;
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::Pixel;
use imageproc::definitions::Clamp;
use imageproc::drawing::{draw_text_mut, text_size, Canvas};

use crate::error::{MontageError, MontageResult};

/// A loaded font with the scales used by one montage run
pub struct FontCache {
    font: FontArc,
    scales: HashMap<u32, PxScale>,
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache")
            .field("sizes", &self.scales.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FontCache {
    /// Load a TrueType/OpenType font file
    pub fn load(path: &Path) -> MontageResult<Self> {
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            MontageError::config(format!("Could not load font {}: {}", path.display(), e))
        })?;
        Ok(Self::from_font(font))
    }

    pub fn from_font(font: FontArc) -> Self {
        Self {
            font,
            scales: HashMap::new(),
        }
    }

    fn scale(&mut self, size: u32) -> PxScale {
        *self
            .scales
            .entry(size)
            .or_insert_with(|| PxScale::from(size as f32))
    }

    /// Width and height of `text` rendered at `size` pixels
    pub fn measure(&mut self, size: u32, text: &str) -> (u32, u32) {
        let scale = self.scale(size);
        text_size(scale, &self.font, text)
    }

    /// Draw `text` with its top-left corner at (`x`, `y`)
    pub fn draw<C>(&mut self, canvas: &mut C, color: C::Pixel, x: i32, y: i32, size: u32, text: &str)
    where
        C: Canvas,
        <C::Pixel as Pixel>::Subpixel: Into<f32> + Clamp<f32>,
    {
        let scale = self.scale(size);
        draw_text_mut(canvas, color, x, y, scale, &self.font, text);
    }

    /// Number of distinct sizes used so far
    pub fn cached_sizes(&self) -> usize {
        self.scales.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const SYSTEM_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

    #[test]
    fn test_missing_font_file() {
        assert!(FontCache::load(Path::new("/no/such/font.ttf")).is_err());
    }

    #[test]
    fn test_invalid_font_data() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"not a font").unwrap();
        assert!(matches!(
            FontCache::load(file.path()),
            Err(MontageError::Config { .. })
        ));
    }

    #[test]
    fn test_measure_and_draw_with_system_font() {
        let path = Path::new(SYSTEM_FONT);
        if !path.exists() {
            return;
        }
        let mut fonts = FontCache::load(path).unwrap();
        let (small, _) = fonts.measure(10, "00:01:02");
        let (large, _) = fonts.measure(40, "00:01:02");
        assert!(large > small);
        assert_eq!(fonts.cached_sizes(), 2);

        let mut canvas = RgbImage::new(200, 60);
        fonts.draw(&mut canvas, Rgb([255, 255, 255]), 5, 5, 40, "Hello");
        assert!(canvas.pixels().any(|p| p.0 != [0, 0, 0]));
    }
}
