//! Command implementations

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::app::{AppContainer, InspectInteractor};
use crate::domain::model::Config;
use crate::output::resolve_single;

/// Execute the jpg or gif command for a file or a directory
pub async fn montage(container: &dyn AppContainer, config: &Config) -> Result<()> {
    let input = &config.input_path;
    if !input.exists() {
        bail!("Input does not exist: {}", input.display());
    }

    if input.is_dir() {
        let report = container
            .batch_interactor()
            .execute(input, config)
            .await
            .with_context(|| format!("Failed to process directory {}", input.display()))?;

        if report.all_failed() {
            bail!("All {} files in {} failed", report.total, input.display());
        }
        return Ok(());
    }

    let target = resolve_single(input, &config.output_path, config.output_format);
    let report = container
        .montage_interactor()
        .execute(config, &target)
        .await
        .with_context(|| format!("Failed to create montage for {}", input.display()))?;

    info!(
        "Created {} montage ({} grid, {} bytes): {}",
        report.format.extension(),
        report.grid,
        report.bytes,
        report.output
    );
    Ok(())
}

/// Execute the inspect command
pub async fn inspect(container: &dyn AppContainer, config: &Config, json: bool) -> Result<()> {
    let input = &config.input_path;
    if !input.is_file() {
        bail!("Input file does not exist: {}", input.display());
    }

    let report = container
        .inspect_interactor()
        .execute(config)
        .await
        .with_context(|| format!("Failed to inspect {}", input.display()))?;

    if json {
        println!("{}", InspectInteractor::format_as_json(&report)?);
    } else {
        print!("{}", InspectInteractor::format_as_text(&report));
    }
    Ok(())
}
