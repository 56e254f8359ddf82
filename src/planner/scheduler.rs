//! Timestamp scheduling for grid samples

use serde::Serialize;
use tracing::debug;

use crate::domain::model::*;
use crate::domain::rules::{AutoGridSelector, SamplingWindow};
use crate::error::{MontageError, MontageResult};

/// Computes evenly spaced sample timestamps across the non-skipped part of a video
#[derive(Debug, Clone, Copy)]
pub struct TimestampScheduler {
    window: SamplingWindow,
}

/// Resolved grid and timestamps for one video
#[derive(Debug, Clone, Serialize)]
pub struct SamplePlan {
    pub grid: GridSize,
    pub thumbnail: ThumbnailSize,
    pub start: f64,
    pub end: f64,
    pub interval: f64,
    pub timestamps: Vec<f64>,
}

impl TimestampScheduler {
    /// Create a scheduler, validating the skip percentages
    pub fn new(skip_start_percent: f64, skip_end_percent: f64) -> MontageResult<Self> {
        Ok(Self {
            window: SamplingWindow::new(skip_start_percent, skip_end_percent)?,
        })
    }

    /// Create a scheduler from the configured skip percentages
    pub fn from_config(config: &Config) -> MontageResult<Self> {
        Self::new(config.skip_start_percent, config.skip_end_percent)
    }

    /// Grid to use for a video of `duration` seconds
    pub fn resolve_grid(config: &Config, duration: f64) -> MontageResult<GridSize> {
        let grid = AutoGridSelector::for_config(config, duration);
        if grid.columns == 0 || grid.rows == 0 {
            return Err(MontageError::invalid_range(format!(
                "grid must have at least one column and row, got {grid}"
            )));
        }
        Ok(grid)
    }

    /// Schedule `count` samples over a video of `duration` seconds
    pub fn schedule(&self, duration: f64, count: usize) -> MontageResult<Vec<ScheduledSample>> {
        if count == 0 {
            return Err(MontageError::invalid_range("sample count must be positive"));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(MontageError::invalid_range(format!(
                "video duration must be a non-negative number, got {duration}"
            )));
        }

        let (start, end) = self.window.bounds(duration);
        let interval = (end - start) / count as f64;
        debug!(
            "Scheduling {} samples from {:.2}s to {:.2}s (interval {:.2}s)",
            count, start, end, interval
        );

        Ok((0..count)
            .map(|index| ScheduledSample {
                index,
                timestamp: start + index as f64 * interval,
            })
            .collect())
    }

    /// Resolve grid, thumbnail size and timestamps for a probed video
    pub fn plan(config: &Config, info: &VideoInfo) -> MontageResult<SamplePlan> {
        let scheduler = Self::from_config(config)?;
        let grid = Self::resolve_grid(config, info.duration)?;
        let thumbnail = ThumbnailSize::resolve(config.thumb_width, config.thumb_height, info)?;
        let samples = scheduler.schedule(info.duration, grid.cell_count())?;
        let (start, end) = scheduler.window.bounds(info.duration);

        Ok(SamplePlan {
            grid,
            thumbnail,
            start,
            end,
            interval: (end - start) / grid.cell_count() as f64,
            timestamps: samples.iter().map(|s| s.timestamp).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_schedule_evenly_spaced() {
        let scheduler = TimestampScheduler::new(5.0, 5.0).unwrap();
        let samples = scheduler.schedule(600.0, 20).unwrap();

        assert_eq!(samples.len(), 20);
        assert!((samples[0].timestamp - 30.0).abs() < 1e-9);
        for pair in samples.windows(2) {
            assert!((pair[1].timestamp - pair[0].timestamp - 27.0).abs() < 1e-9);
        }
        assert!(samples[19].timestamp < 570.0);
        assert!(samples.iter().enumerate().all(|(i, s)| s.index == i));
    }

    #[test]
    fn test_schedule_rejects_zero_count() {
        let scheduler = TimestampScheduler::new(0.0, 0.0).unwrap();
        assert!(matches!(
            scheduler.schedule(10.0, 0),
            Err(MontageError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_invalid_skip_rejected_at_construction() {
        assert!(matches!(
            TimestampScheduler::new(60.0, 50.0),
            Err(MontageError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_plan_uses_auto_grid() {
        let config = Config {
            auto_grid: true,
            ..Config::default()
        };
        let info = VideoInfo {
            path: PathBuf::from("a.mp4"),
            duration: 200.0,
            width: 1280,
            height: 720,
            file_size: 0,
            video_codec: "h264".into(),
            audio_codec: String::new(),
            bit_rate: 0,
            avg_frame_rate: Rational::new(25, 1),
        };

        let plan = TimestampScheduler::plan(&config, &info).unwrap();
        assert_eq!(plan.grid, GridSize::new(3, 3));
        assert_eq!(plan.timestamps.len(), 9);
        assert_eq!(plan.thumbnail, ThumbnailSize { width: 640, height: 360 });
    }

    #[test]
    fn test_resolve_grid_rejects_empty_grid() {
        let config = Config {
            columns: 0,
            ..Config::default()
        };
        assert!(TimestampScheduler::resolve_grid(&config, 10.0).is_err());
    }
}
