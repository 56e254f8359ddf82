// Median-cut palette construction

use std::cell::RefCell;
use std::collections::HashMap;

use image::imageops::ColorMap;
use image::{Rgb, RgbImage};

/// A set of distinct colours with their pixel counts
struct ColorBox {
    colors: Vec<([u8; 3], u32)>,
}

impl ColorBox {
    fn population(&self) -> u64 {
        self.colors.iter().map(|(_, n)| u64::from(*n)).sum()
    }

    /// Channel with the widest value range and that range
    fn widest_channel(&self) -> (usize, u8) {
        (0..3)
            .map(|channel| {
                let (min, max) = self.colors.iter().fold((u8::MAX, u8::MIN), |(lo, hi), (c, _)| {
                    (lo.min(c[channel]), hi.max(c[channel]))
                });
                (channel, max.saturating_sub(min))
            })
            .max_by_key(|(_, range)| *range)
            .unwrap_or((0, 0))
    }

    /// Split at the population median of the widest channel
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.colors.sort_unstable_by_key(|(c, _)| c[channel]);

        let half = self.population() / 2;
        let mut seen = 0u64;
        let mut cut = 1;
        for (i, (_, n)) in self.colors.iter().enumerate() {
            seen += u64::from(*n);
            if seen >= half {
                cut = i + 1;
                break;
            }
        }
        let cut = cut.clamp(1, self.colors.len() - 1);
        let upper = self.colors.split_off(cut);
        (self, ColorBox { colors: upper })
    }

    fn average(&self) -> [u8; 3] {
        let total = self.population().max(1);
        let mut sums = [0u64; 3];
        for (color, n) in &self.colors {
            for channel in 0..3 {
                sums[channel] += u64::from(color[channel]) * u64::from(*n);
            }
        }
        sums.map(|sum| ((sum + total / 2) / total) as u8)
    }
}

/// Palette built by median cut, usable with `image::imageops::dither`
#[derive(Debug)]
pub struct MedianCutPalette {
    palette: Vec<[u8; 3]>,
    nearest: RefCell<HashMap<[u8; 3], usize>>,
}

impl MedianCutPalette {
    /// Build a palette of at most `max_colors` entries for `image`
    pub fn build(image: &RgbImage, max_colors: usize) -> Self {
        let max_colors = max_colors.clamp(1, 256);
        let mut histogram: HashMap<[u8; 3], u32> = HashMap::new();
        for pixel in image.pixels() {
            *histogram.entry(pixel.0).or_insert(0) += 1;
        }

        let mut boxes = vec![ColorBox {
            colors: histogram.into_iter().collect(),
        }];

        while boxes.len() < max_colors {
            let candidate = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.colors.len() > 1)
                .max_by_key(|(_, b)| b.population())
                .map(|(i, _)| i);
            let Some(index) = candidate else {
                break;
            };
            let (low, high) = boxes.swap_remove(index).split();
            boxes.push(low);
            boxes.push(high);
        }

        let palette = boxes
            .iter()
            .filter(|b| !b.colors.is_empty())
            .map(ColorBox::average)
            .collect();

        Self {
            palette,
            nearest: RefCell::new(HashMap::new()),
        }
    }

    /// Palette entries
    pub fn colors(&self) -> &[[u8; 3]] {
        &self.palette
    }

    fn nearest_index(&self, color: [u8; 3]) -> usize {
        if let Some(index) = self.nearest.borrow().get(&color) {
            return *index;
        }
        let index = self
            .palette
            .iter()
            .enumerate()
            .min_by_key(|(_, entry)| {
                (0..3)
                    .map(|c| {
                        let d = i32::from(entry[c]) - i32::from(color[c]);
                        d * d
                    })
                    .sum::<i32>()
            })
            .map(|(i, _)| i)
            .unwrap_or(0);
        self.nearest.borrow_mut().insert(color, index);
        index
    }
}

impl ColorMap for MedianCutPalette {
    type Color = Rgb<u8>;

    fn index_of(&self, color: &Rgb<u8>) -> usize {
        self.nearest_index(color.0)
    }

    fn lookup(&self, index: usize) -> Option<Rgb<u8>> {
        self.palette.get(index).map(|c| Rgb(*c))
    }

    fn has_lookup(&self) -> bool {
        true
    }

    fn map_color(&self, color: &mut Rgb<u8>) {
        if let Some(entry) = self.palette.get(self.nearest_index(color.0)) {
            *color = Rgb(*entry);
        }
    }
}
