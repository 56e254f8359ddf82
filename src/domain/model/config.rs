// Configuration value object consumed by the pipeline

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MontageError, MontageResult};

/// Output encoding for the montage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpg,
    Gif,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Gif => "gif",
        }
    }
}

/// Auto-grid rule: videos up to `max_duration` seconds use `columns` x `rows`.
///
/// A negative `max_duration` marks the unbounded default rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationGridRule {
    pub max_duration: f64,
    pub columns: u32,
    pub rows: u32,
}

impl DurationGridRule {
    pub const fn new(max_duration: f64, columns: u32, rows: u32) -> Self {
        Self {
            max_duration,
            columns,
            rows,
        }
    }
}

/// One cell of a custom layout as written in a config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCellSpec {
    pub row: i64,
    pub col: i64,
    #[serde(default = "one")]
    pub row_span: i64,
    #[serde(default = "one")]
    pub col_span: i64,
    #[serde(default)]
    pub index: Option<usize>,
}

fn one() -> i64 {
    1
}

/// Montage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Input/Output paths
    pub input_path: PathBuf,
    /// Empty means "next to the input", `-` means stdout
    pub output_path: String,
    pub output_format: OutputFormat,
    pub overwrite: bool,

    // Grid layout
    pub columns: u32,
    pub rows: u32,
    pub auto_grid: bool,
    pub duration_grid_rules: Vec<DurationGridRule>,
    pub layout: Vec<GridCellSpec>,
    pub thumb_width: u32,
    /// Zero or negative derives the height from the aspect ratio
    pub thumb_height: i32,
    pub padding: u32,
    pub margin: u32,
    pub header_height: u32,

    // Frame extraction
    pub skip_start_percent: f64,
    pub skip_end_percent: f64,
    /// Zero means one worker per CPU
    pub max_workers: usize,

    // Appearance
    pub font_file: Option<PathBuf>,
    pub font_color: String,
    pub shadow_color: String,
    pub background_color: String,
    pub show_full_path: bool,
    pub jpeg_quality: u8,

    // GIF
    pub gif_clip_duration: f64,
    pub gif_clip_start_offset: Option<f64>,
    pub gif_clip_end_offset: Option<f64>,
    pub gif_fps: u32,
    pub gif_colors: u16,
    pub gif_loop: u16,
    pub gif_dither: bool,
    pub gif_optimize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::new(),
            output_path: String::new(),
            output_format: OutputFormat::Jpg,
            overwrite: false,
            columns: 4,
            rows: 5,
            auto_grid: false,
            duration_grid_rules: vec![
                DurationGridRule::new(300.0, 3, 3),
                DurationGridRule::new(1200.0, 4, 4),
                DurationGridRule::new(3600.0, 4, 5),
                DurationGridRule::new(-1.0, 5, 6),
            ],
            layout: Vec::new(),
            thumb_width: 640,
            thumb_height: -1,
            padding: 5,
            margin: 20,
            header_height: 120,
            skip_start_percent: 5.0,
            skip_end_percent: 5.0,
            max_workers: 8,
            font_file: None,
            font_color: "white".to_string(),
            shadow_color: "black".to_string(),
            background_color: "#222222".to_string(),
            show_full_path: false,
            jpeg_quality: 85,
            gif_clip_duration: 2.0,
            gif_clip_start_offset: None,
            gif_clip_end_offset: None,
            gif_fps: 10,
            gif_colors: 256,
            gif_loop: 0,
            gif_dither: true,
            gif_optimize: true,
        }
    }
}

impl Config {
    /// Validate values that do not depend on the input video
    pub fn validate(&self) -> MontageResult<()> {
        if let Some(rule) = self
            .duration_grid_rules
            .iter()
            .find(|rule| rule.columns == 0 || rule.rows == 0)
        {
            return Err(MontageError::config(format!(
                "grid rule for {}s must have at least one column and row, got {}x{}",
                rule.max_duration, rule.columns, rule.rows
            )));
        }
        // An unbounded auto-grid rule always replaces the static grid
        let static_grid_used = !self.auto_grid
            || !self
                .duration_grid_rules
                .iter()
                .any(|rule| rule.max_duration < 0.0);
        if static_grid_used && (self.columns == 0 || self.rows == 0) {
            return Err(MontageError::config(format!(
                "grid must have at least one column and row, got {}x{}",
                self.columns, self.rows
            )));
        }
        if self.thumb_width == 0 {
            return Err(MontageError::config("thumb_width must be positive"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(MontageError::config(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if self.gif_fps == 0 {
            return Err(MontageError::config("gif_fps must be positive"));
        }
        if !(2..=256).contains(&self.gif_colors) {
            return Err(MontageError::config(format!(
                "gif_colors must be between 2 and 256, got {}",
                self.gif_colors
            )));
        }
        if !(self.gif_clip_duration > 0.0) {
            return Err(MontageError::config(format!(
                "gif_clip_duration must be positive, got {}",
                self.gif_clip_duration
            )));
        }
        Ok(())
    }

    /// Worker count with zero resolved to the CPU count
    pub fn effective_max_workers(&self) -> usize {
        if self.max_workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.max_workers
        }
    }

    /// Clip window offsets relative to the clip center, in seconds
    pub fn gif_clip_offsets(&self) -> (f64, f64) {
        let half = self.gif_clip_duration / 2.0;
        (
            self.gif_clip_start_offset.unwrap_or(-half),
            self.gif_clip_end_offset.unwrap_or(half),
        )
    }
}
