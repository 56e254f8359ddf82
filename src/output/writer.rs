//! Output placement and writing

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::model::OutputFormat;
use crate::error::{MontageError, MontageResult};
use crate::output::naming::{montage_filename, unique_filename};
use crate::ports::OutputPort;

/// Value of `output_path` that streams the encoded bytes to stdout
pub const STDOUT_MARKER: &str = "-";

/// Where a montage goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    File(PathBuf),
    Stdout,
}

impl std::fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputTarget::File(path) => write!(f, "{}", path.display()),
            OutputTarget::Stdout => write!(f, "<stdout>"),
        }
    }
}

fn beside(video: &Path, format: OutputFormat) -> PathBuf {
    video
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(montage_filename(video, format))
}

/// A path that names a directory: an existing one, or one without extension
fn is_directory_like(path: &Path) -> bool {
    path.is_dir() || path.extension().is_none()
}

/// Target for a single input file
pub fn resolve_single(video: &Path, output_path: &str, format: OutputFormat) -> OutputTarget {
    match output_path {
        STDOUT_MARKER => OutputTarget::Stdout,
        "" => OutputTarget::File(beside(video, format)),
        path => {
            let path = PathBuf::from(path);
            if is_directory_like(&path) {
                OutputTarget::File(path.join(montage_filename(video, format)))
            } else {
                OutputTarget::File(path)
            }
        }
    }
}

/// Target for one file of a directory batch
pub fn resolve_batch(video: &Path, input_root: &Path, output_path: &str, format: OutputFormat) -> OutputTarget {
    match output_path {
        "" => OutputTarget::File(beside(video, format)),
        STDOUT_MARKER => {
            warn!(
                "Cannot stream a batch to stdout, writing next to {}",
                video.display()
            );
            OutputTarget::File(beside(video, format))
        }
        dir => OutputTarget::File(Path::new(dir).join(unique_filename(video, input_root, format))),
    }
}

/// Writes encoded montages through an `OutputPort`, honouring `overwrite`
pub struct MontageWriter {
    port: Arc<dyn OutputPort>,
    overwrite: bool,
}

impl MontageWriter {
    pub fn new(port: Arc<dyn OutputPort>, overwrite: bool) -> Self {
        Self { port, overwrite }
    }

    /// Fail with `OutputExists` when the target exists and overwrite is off
    pub async fn ensure_writable(&self, target: &OutputTarget) -> MontageResult<()> {
        if let OutputTarget::File(path) = target {
            if !self.overwrite && self.port.exists(path).await {
                return Err(MontageError::OutputExists { path: path.clone() });
            }
        }
        Ok(())
    }

    /// Write `bytes` to `target`
    pub async fn write(&self, target: &OutputTarget, bytes: &[u8]) -> MontageResult<()> {
        self.ensure_writable(target).await?;
        match target {
            OutputTarget::File(path) => {
                self.port.write_file(path, bytes).await?;
                info!("Montage saved to {}", path.display());
            }
            OutputTarget::Stdout => self.port.write_stdout(bytes).await?,
        }
        Ok(())
    }
}
