// Filesystem output adapter - Writes encoded montages to disk or stdout

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::MontageResult;
use crate::ports::OutputPort;

/// `OutputPort` backed by `tokio::fs` and the process stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOutputAdapter;

impl FsOutputAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "montage".to_string());
    path.with_file_name(format!(".tmp_{}", name))
}

#[async_trait]
impl OutputPort for FsOutputAdapter {
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> MontageResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write beside the target then rename, so readers never see a partial image
        let temp_path = temp_path_for(path);
        let mut file = tokio::fs::File::create(&temp_path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }

    async fn write_stdout(&self, bytes: &[u8]) -> MontageResult<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(bytes).await?;
        stdout.flush().await?;
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }
}
