//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::domain::model::Config;

fn quality_range(s: &str) -> Result<u8, String> {
    number_range(s, 1, 100)
}

fn colors_range(s: &str) -> Result<u16, String> {
    number_range(s, 2, 256)
}

fn percent_range(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is not in 0..=100", value))
    }
}

/// Options shared by the jpg and gif commands
#[derive(Args, Debug, Default)]
pub struct CommonArgs {
    /// Input video file or directory
    pub input: PathBuf,

    /// Output file or directory, `-` for stdout (default: next to the input)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of grid columns
    #[arg(long)]
    pub columns: Option<u32>,

    /// Number of grid rows
    #[arg(long)]
    pub rows: Option<u32>,

    /// Pick the grid from the video duration
    #[arg(long)]
    pub auto_grid: bool,

    /// Thumbnail width in pixels
    #[arg(long)]
    pub thumb_width: Option<u32>,

    /// Thumbnail height in pixels, -1 keeps the aspect ratio
    #[arg(long, allow_negative_numbers = true)]
    pub thumb_height: Option<i32>,

    /// Space between cells
    #[arg(long)]
    pub padding: Option<u32>,

    /// Space around the grid
    #[arg(long)]
    pub margin: Option<u32>,

    /// Header height in pixels
    #[arg(long = "header")]
    pub header_height: Option<u32>,

    /// Percent of the video skipped at the start
    #[arg(long, value_parser = percent_range)]
    pub skip_start: Option<f64>,

    /// Percent of the video skipped at the end
    #[arg(long, value_parser = percent_range)]
    pub skip_end: Option<f64>,

    /// Parallel extraction workers, 0 for one per CPU
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,
}

impl CommonArgs {
    /// Apply the options that were given on top of `config`
    pub fn apply(&self, config: &mut Config) {
        config.input_path = self.input.clone();
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        if let Some(columns) = self.columns {
            config.columns = columns;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if self.auto_grid {
            config.auto_grid = true;
        }
        if let Some(width) = self.thumb_width {
            config.thumb_width = width;
        }
        if let Some(height) = self.thumb_height {
            config.thumb_height = height;
        }
        if let Some(padding) = self.padding {
            config.padding = padding;
        }
        if let Some(margin) = self.margin {
            config.margin = margin;
        }
        if let Some(header) = self.header_height {
            config.header_height = header;
        }
        if let Some(skip) = self.skip_start {
            config.skip_start_percent = skip;
        }
        if let Some(skip) = self.skip_end {
            config.skip_end_percent = skip;
        }
        if let Some(workers) = self.max_workers {
            config.max_workers = workers;
        }
        if self.overwrite {
            config.overwrite = true;
        }
    }
}

/// Fonts and colours
#[derive(Args, Debug, Default)]
pub struct AppearanceArgs {
    /// TrueType font for the header and labels
    #[arg(long)]
    pub font_file: Option<PathBuf>,

    /// Title colour (#RRGGBB or a colour name)
    #[arg(long)]
    pub font_color: Option<String>,

    /// Text shadow colour
    #[arg(long)]
    pub shadow_color: Option<String>,

    /// Canvas background colour
    #[arg(long)]
    pub background_color: Option<String>,

    /// Show the absolute path in the header instead of the file name
    #[arg(long)]
    pub show_full_path: bool,
}

impl AppearanceArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(font) = &self.font_file {
            config.font_file = Some(font.clone());
        }
        if let Some(color) = &self.font_color {
            config.font_color = color.clone();
        }
        if let Some(color) = &self.shadow_color {
            config.shadow_color = color.clone();
        }
        if let Some(color) = &self.background_color {
            config.background_color = color.clone();
        }
        if self.show_full_path {
            config.show_full_path = true;
        }
    }
}

/// Arguments for the jpg command
#[derive(Args, Debug)]
pub struct JpgArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub appearance: AppearanceArgs,

    /// JPEG quality (1-100)
    #[arg(long, value_parser = quality_range)]
    pub quality: Option<u8>,
}

/// Arguments for the gif command
#[derive(Args, Debug)]
pub struct GifArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub appearance: AppearanceArgs,

    /// Length of each clip in seconds
    #[arg(long)]
    pub clip_duration: Option<f64>,

    /// Animation frame rate
    #[arg(long)]
    pub fps: Option<u32>,

    /// Palette size (2-256)
    #[arg(long, value_parser = colors_range)]
    pub colors: Option<u16>,

    /// Loop count, 0 loops forever
    #[arg(long = "loop")]
    pub loop_count: Option<u16>,

    /// Disable dithering when reducing colours
    #[arg(long)]
    pub no_dither: bool,

    /// Use the faster, lower quality GIF palette search
    #[arg(long)]
    pub no_optimize: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    #[arg(long)]
    pub columns: Option<u32>,

    #[arg(long)]
    pub rows: Option<u32>,

    #[arg(long)]
    pub auto_grid: bool,
}
