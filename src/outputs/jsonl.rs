//! Record sinks.
//!
//! A [`Sink`] is an append-only consumer of [`ArticleRecord`]s. Failures are
//! reported per record; the crawler decides whether to keep going.

use crate::errors::SinkError;
use crate::models::ArticleRecord;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Append-only record consumer.
pub trait Sink {
    async fn write(&mut self, record: &ArticleRecord) -> Result<(), SinkError>;

    /// Flush buffered output. Called once when the crawl ends.
    async fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes one JSON object per line, appending to an existing file.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    file: File,
    written: usize,
}

impl JsonLinesSink {
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        info!("Opened JSON Lines sink");
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl Sink for JsonLinesSink {
    async fn write(&mut self, record: &ArticleRecord) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.file.write_all(&line).await?;
        self.written += 1;
        debug!(url = %record.url, written = self.written, "Appended record");
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), SinkError> {
        self.file.flush().await?;
        self.file.sync_data().await?;
        info!(path = %self.path.display(), written = self.written, "Closed JSON Lines sink");
        Ok(())
    }
}
