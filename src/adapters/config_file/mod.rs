// Config file adapter - Load montage settings from YAML or TOML files

use std::path::Path;

use tracing::{info, warn};

use crate::domain::model::Config;
use crate::error::{MontageError, MontageResult};

/// Loads `Config` from disk; `.toml` files use TOML, anything else YAML
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigFileAdapter;

impl ConfigFileAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a config file
    pub fn load(&self, path: &Path) -> MontageResult<Config> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            MontageError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config = self.parse(path, &content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(Self::drop_missing_font(config))
    }

    /// Parse config text, choosing the format from the file extension
    pub fn parse(&self, path: &Path, content: &str) -> MontageResult<Config> {
        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(content).map_err(|e| {
                MontageError::config(format!("Failed to parse TOML config {}: {}", path.display(), e))
            })
        } else {
            // An empty YAML document means "all defaults"
            if content.trim().is_empty() {
                return Ok(Config::default());
            }
            serde_yaml::from_str(content).map_err(|e| {
                MontageError::config(format!("Failed to parse YAML config {}: {}", path.display(), e))
            })
        }
    }

    /// A configured font that does not exist disables text instead of failing
    pub fn drop_missing_font(mut config: Config) -> Config {
        if let Some(font) = &config.font_file {
            if !font.exists() {
                warn!("Font file not found: {}, text rendering disabled", font.display());
                config.font_file = None;
            }
        }
        config
    }
}
