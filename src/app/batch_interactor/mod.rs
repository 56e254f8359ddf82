// Batch interactor - Generates montages for every video under a directory

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::app::montage_interactor::MontageInteractor;
use crate::domain::model::Config;
use crate::error::{MontageError, MontageResult};
use crate::output::resolve_batch;
use crate::utils::scan_video_files;

/// Per-batch tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchReport {
    /// A batch fails only when nothing could be produced
    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.failed == self.total
    }
}

/// Interactor for directory inputs
pub struct BatchInteractor {
    montage: Arc<MontageInteractor>,
}

impl BatchInteractor {
    pub fn new(montage: Arc<MontageInteractor>) -> Self {
        Self { montage }
    }

    /// Process every video under `root` in path order, isolating failures per file
    pub async fn execute(&self, root: &Path, base: &Config) -> MontageResult<BatchReport> {
        let files = scan_video_files(root);
        let mut report = BatchReport {
            total: files.len(),
            ..BatchReport::default()
        };

        if files.is_empty() {
            warn!("No video files found in {}", root.display());
            return Ok(report);
        }
        info!("Found {} video files in {}", files.len(), root.display());

        for (position, file) in files.iter().enumerate() {
            info!("[{}/{}] {}", position + 1, files.len(), file.display());

            let mut config = base.clone();
            config.input_path = file.clone();
            let target = resolve_batch(file, root, &base.output_path, base.output_format);

            match self.montage.execute(&config, &target).await {
                Ok(_) => report.succeeded += 1,
                Err(MontageError::OutputExists { path }) => {
                    warn!("Skipping {}: {} already exists", file.display(), path.display());
                    report.skipped += 1;
                }
                Err(e) => {
                    error!("Failed to process {}: {}", file.display(), e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Batch complete: {} succeeded, {} failed, {} skipped of {}",
            report.succeeded, report.failed, report.skipped, report.total
        );
        Ok(report)
    }
}
