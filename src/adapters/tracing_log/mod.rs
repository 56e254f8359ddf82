// Tracing log adapter - Subscriber setup for the montage binary

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

use crate::error::{MontageError, MontageResult};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = MontageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(MontageError::config(format!("Unknown log format: {}", other))),
        }
    }
}

/// Logging settings resolved from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub format: LogFormat,
}

impl LogSettings {
    /// `quiet` wins over `verbose`, both win over the explicit level
    pub fn resolve(level: &str, verbose: bool, quiet: bool, format: LogFormat) -> Self {
        let level = if quiet {
            "error"
        } else if verbose {
            "debug"
        } else {
            level
        };
        Self {
            level: level.to_ascii_lowercase(),
            format,
        }
    }

    fn filter(&self) -> MontageResult<EnvFilter> {
        // RUST_LOG takes precedence when set
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            if let Ok(filter) = EnvFilter::try_from_default_env() {
                return Ok(filter);
            }
        }
        EnvFilter::try_new(&self.level)
            .map_err(|e| MontageError::config(format!("Invalid log level '{}': {}", self.level, e)))
    }
}

/// Tracing log adapter
pub struct TracingLogAdapter;

impl TracingLogAdapter {
    /// Install the global subscriber, writing to stderr so stdout stays free
    /// for image bytes. A second call is a no-op.
    pub fn init(settings: &LogSettings) -> MontageResult<()> {
        let filter = settings.filter()?;
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false);

        let _ = match settings.format {
            LogFormat::Text => builder.try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        Ok(())
    }
}
