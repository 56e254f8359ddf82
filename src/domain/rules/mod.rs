// Domain rules - Grid selection and sampling window policies

use crate::domain::model::*;
use crate::error::{MontageError, MontageResult};

/// Business rules for duration-driven grid selection
pub struct AutoGridSelector;

impl AutoGridSelector {
    /// Resolve the grid for a video of `duration` seconds.
    ///
    /// Bounded rules are tried in ascending threshold order and the first one
    /// whose threshold is at least the duration wins. Otherwise the unbounded
    /// rule applies. Without any applicable rule the configured grid is kept.
    pub fn select(duration: f64, rules: &[DurationGridRule], configured: GridSize) -> GridSize {
        let mut bounded: Vec<&DurationGridRule> =
            rules.iter().filter(|rule| rule.max_duration > 0.0).collect();
        bounded.sort_by(|a, b| a.max_duration.total_cmp(&b.max_duration));

        if let Some(rule) = bounded.iter().find(|rule| duration <= rule.max_duration) {
            return GridSize::new(rule.columns, rule.rows);
        }

        rules
            .iter()
            .find(|rule| rule.max_duration < 0.0)
            .map(|rule| GridSize::new(rule.columns, rule.rows))
            .unwrap_or(configured)
    }

    /// Grid for a configuration, honouring the auto-grid flag
    pub fn for_config(config: &Config, duration: f64) -> GridSize {
        let configured = GridSize::new(config.columns, config.rows);
        if !config.auto_grid || config.duration_grid_rules.is_empty() {
            return configured;
        }
        Self::select(duration, &config.duration_grid_rules, configured)
    }
}

/// The part of a video that samples are drawn from, after skipping intro/outro
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingWindow {
    skip_start_percent: f64,
    skip_end_percent: f64,
}

impl SamplingWindow {
    /// Validate the skip percentages
    pub fn new(skip_start_percent: f64, skip_end_percent: f64) -> MontageResult<Self> {
        for (name, value) in [
            ("skip_start_percent", skip_start_percent),
            ("skip_end_percent", skip_end_percent),
        ] {
            if !(0.0..100.0).contains(&value) {
                return Err(MontageError::invalid_range(format!(
                    "{name} must be in [0, 100), got {value}"
                )));
            }
        }

        if skip_start_percent + skip_end_percent >= 100.0 {
            return Err(MontageError::invalid_range(format!(
                "skip_start_percent ({skip_start_percent}) + skip_end_percent ({skip_end_percent}) must be below 100"
            )));
        }

        Ok(Self {
            skip_start_percent,
            skip_end_percent,
        })
    }

    /// Start and end of the window in seconds for a video of `duration` seconds
    pub fn bounds(&self, duration: f64) -> (f64, f64) {
        let start = duration * self.skip_start_percent / 100.0;
        let end = duration * (1.0 - self.skip_end_percent / 100.0);
        (start, end)
    }
}

/// Business rules for clip windows in GIF mode
pub struct ClipWindow;

impl ClipWindow {
    /// Window half-width used when the requested window collapses
    pub const FALLBACK_HALF_WIDTH: f64 = 1.0;

    /// Compute the `[start, end]` window for a clip centred at `center`
    pub fn around(center: f64, start_offset: f64, end_offset: f64, duration: f64) -> (f64, f64) {
        let clamp = |t: f64| t.clamp(0.0, duration.max(0.0));
        let start = clamp(center + start_offset);
        let end = clamp(center + end_offset);
        if start < end {
            return (start, end);
        }

        (
            clamp(center - Self::FALLBACK_HALF_WIDTH),
            clamp(center + Self::FALLBACK_HALF_WIDTH),
        )
    }
}
