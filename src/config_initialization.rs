//! Configuration initialization and hierarchy management

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::ConfigFileAdapter;
use crate::cli::{Cli, Commands, GifArgs, InspectArgs, JpgArgs};
use crate::domain::model::{Config, OutputFormat};

/// Build the effective configuration following precedence: CLI > File > Defaults
pub fn initialize_configuration(cli: &Cli) -> Result<Config> {
    let mut config = load_config_file(cli)?;

    match &cli.command {
        Commands::Jpg(args) => apply_jpg_overrides(&mut config, args),
        Commands::Gif(args) => apply_gif_overrides(&mut config, args),
        Commands::Inspect(args) => apply_inspect_overrides(&mut config, args),
    }

    // Flags may reintroduce a font path
    let config = ConfigFileAdapter::drop_missing_font(config);
    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Load the file named by `--config`, or the defaults
fn load_config_file(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            ConfigFileAdapter::new()
                .load(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn apply_jpg_overrides(config: &mut Config, args: &JpgArgs) {
    config.output_format = OutputFormat::Jpg;
    args.common.apply(config);
    args.appearance.apply(config);
    if let Some(quality) = args.quality {
        config.jpeg_quality = quality;
    }
}

fn apply_gif_overrides(config: &mut Config, args: &GifArgs) {
    config.output_format = OutputFormat::Gif;
    args.common.apply(config);
    args.appearance.apply(config);
    if let Some(duration) = args.clip_duration {
        config.gif_clip_duration = duration;
    }
    if let Some(fps) = args.fps {
        config.gif_fps = fps;
    }
    if let Some(colors) = args.colors {
        config.gif_colors = colors;
    }
    if let Some(loop_count) = args.loop_count {
        config.gif_loop = loop_count;
    }
    if args.no_dither {
        config.gif_dither = false;
    }
    if args.no_optimize {
        config.gif_optimize = false;
    }
}

fn apply_inspect_overrides(config: &mut Config, args: &InspectArgs) {
    config.input_path = args.input.clone();
    if let Some(columns) = args.columns {
        config.columns = columns;
    }
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if args.auto_grid {
        config.auto_grid = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_cli_overrides_file_values() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "columns: 6\nrows: 2\ngif_fps: 5\njpeg_quality: 70").unwrap();
        let config_path = file.path().to_string_lossy().into_owned();

        let cli = Cli::try_parse_from([
            "montage", "-c", config_path.as_str(), "gif", "v.mp4", "--rows", "7",
        ])
        .unwrap();
        let config = initialize_configuration(&cli).unwrap();

        assert_eq!(config.output_format, OutputFormat::Gif);
        assert_eq!(config.columns, 6);
        assert_eq!(config.rows, 7);
        assert_eq!(config.gif_fps, 5);
        assert_eq!(config.jpeg_quality, 70);
    }

    #[test]
    fn test_defaults_without_file() {
        let cli = Cli::try_parse_from(["montage", "jpg", "v.mp4", "--no-such-flag"]);
        assert!(cli.is_err());

        let cli = Cli::try_parse_from(["montage", "jpg", "v.mp4", "--quality", "95"]).unwrap();
        let config = initialize_configuration(&cli).unwrap();
        assert_eq!(config.output_format, OutputFormat::Jpg);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.columns, 4);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["montage", "-c", "/no/such/file.yaml", "jpg", "v.mp4"]).unwrap();
        assert!(initialize_configuration(&cli).is_err());
    }
}
