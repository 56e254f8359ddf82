//! CLI module for montage
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{AppearanceArgs, CommonArgs, GifArgs, InspectArgs, JpgArgs};

/// Video contact sheet generator
///
/// Builds a grid of thumbnails (JPEG) or short looping clips (GIF) sampled
/// evenly across a video, with a header of file metadata.
#[derive(Parser, Debug)]
#[command(name = "montage")]
#[command(about = "Generate contact sheets and animated GIF grids from videos")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (.yaml, .yml or .toml)
    #[arg(short, long, global = true, env = "MONTAGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log debug details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log format: text or json
    #[arg(long, default_value = "text", global = true)]
    pub log_format: String,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a JPEG contact sheet of still thumbnails
    Jpg(args::JpgArgs),
    /// Build an animated GIF grid of short clips
    Gif(args::GifArgs),
    /// Show video information and the sampling plan
    Inspect(args::InspectArgs),
}
