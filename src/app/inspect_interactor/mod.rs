// Inspect interactor - Reports video metadata and the sampling plan

use std::fmt::Write as _;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::model::*;
use crate::error::{MontageError, MontageResult};
use crate::planner::{SamplePlan, TimestampScheduler};
use crate::ports::*;
use crate::utils::{format_bitrate, format_duration, format_file_size};

/// Metadata and sampling plan of one video
#[derive(Debug, Clone, Serialize)]
pub struct InspectReport {
    pub video: VideoInfo,
    pub plan: SamplePlan,
}

/// Interactor for the inspect use case
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
}

impl InspectInteractor {
    /// Create new inspect interactor with injected ports
    pub fn new(probe_port: Arc<dyn ProbePort>) -> Self {
        Self { probe_port }
    }

    /// Probe the video and resolve the grid and timestamps a montage would use
    pub async fn execute(&self, config: &Config) -> MontageResult<InspectReport> {
        config.validate()?;
        TimestampScheduler::from_config(config)?;

        info!("Inspecting {}", config.input_path.display());
        let video = self.probe_port.probe(&config.input_path).await?;
        let plan = TimestampScheduler::plan(config, &video)?;
        Ok(InspectReport { video, plan })
    }

    /// Format a report as pretty JSON
    pub fn format_as_json(report: &InspectReport) -> MontageResult<String> {
        serde_json::to_string_pretty(report)
            .map_err(|e| MontageError::config(format!("JSON serialization failed: {}", e)))
    }

    /// Format a report as human readable text
    pub fn format_as_text(report: &InspectReport) -> String {
        let video = &report.video;
        let plan = &report.plan;
        let fps = video
            .fps()
            .map(|fps| format!("{:.2}", fps))
            .unwrap_or_else(|| "N/A".to_string());
        let audio = if video.audio_codec.is_empty() {
            "none"
        } else {
            video.audio_codec.as_str()
        };

        let mut out = String::new();
        let _ = writeln!(out, "File:        {}", video.path.display());
        let _ = writeln!(out, "Duration:    {} ({:.2}s)", format_duration(video.duration), video.duration);
        let _ = writeln!(out, "Resolution:  {}x{}", video.width, video.height);
        let _ = writeln!(out, "Frame rate:  {} FPS", fps);
        let _ = writeln!(out, "Bit rate:    {}", format_bitrate(video.bit_rate));
        let _ = writeln!(out, "Size:        {}", format_file_size(video.file_size));
        let _ = writeln!(out, "Codecs:      {} / {}", video.video_codec, audio);
        let _ = writeln!(out, "Grid:        {}", plan.grid);
        let _ = writeln!(out, "Thumbnail:   {}x{}", plan.thumbnail.width, plan.thumbnail.height);
        let _ = writeln!(
            out,
            "Window:      {} - {} (every {:.2}s)",
            format_duration(plan.start),
            format_duration(plan.end),
            plan.interval
        );
        let _ = writeln!(out, "Timestamps:");
        for (index, timestamp) in plan.timestamps.iter().enumerate() {
            let _ = writeln!(out, "  {:>3}  {}  ({:.3}s)", index, format_duration(*timestamp), timestamp);
        }
        out
    }
}
