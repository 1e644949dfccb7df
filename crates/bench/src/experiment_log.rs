//! Append-only JSONL log shared by concurrent workers.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use fen_core::ExperimentRecord;

use crate::error::BenchError;

pub struct ExperimentLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ExperimentLog {
    /// Open `path` for appending, creating it and its parent directory if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, BenchError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `record` as one complete line.
    pub async fn append(&self, record: &ExperimentRecord) -> Result<(), BenchError> {
        let mut line = record.to_json_line()?;
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
