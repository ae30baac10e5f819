//! Shared result file.
//!
//! Every task appends to the same file. Writes are serialized through a
//! mutex and flushed before the lock is released, so a reader tailing the
//! file sees each result as soon as its write returns. No delimiter is
//! added here; callers decide what goes between results.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::OutputConfig;
use crate::error::{Result, RuntimeError};

/// Mutually exclusive, append-only result destination.
#[derive(Debug)]
pub struct ResultSink {
    path: PathBuf,
    file: Mutex<Option<File>>,
    writes: AtomicUsize,
    bytes: AtomicU64,
}

impl ResultSink {
    /// Opens the result file, truncating it unless `append` is set.
    ///
    /// Missing parent directories are created.
    pub async fn open(config: &OutputConfig) -> Result<Self> {
        let path = config.path.clone();
        let sink_err = |source| RuntimeError::Sink {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(sink_err)?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if config.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&path).await.map_err(sink_err)?;

        debug!(path = %path.display(), append = config.append, "opened result sink");

        Ok(Self {
            path,
            file: Mutex::new(Some(file)),
            writes: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
        })
    }

    /// Appends `text` and flushes it before returning.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::SinkClosed` after [`close`](Self::close), or
    /// `RuntimeError::Sink` if the write fails.
    pub async fn write(&self, text: &str) -> Result<()> {
        let mut guard = self.file.lock().await;
        let file = guard.as_mut().ok_or(RuntimeError::SinkClosed)?;

        if !text.is_empty() {
            file.write_all(text.as_bytes())
                .await
                .map_err(|source| self.error(source))?;
        }
        file.flush().await.map_err(|source| self.error(source))?;

        self.writes.fetch_add(1, Ordering::SeqCst);
        self.bytes.fetch_add(text.len() as u64, Ordering::SeqCst);
        trace!(bytes = text.len(), "result written");

        Ok(())
    }

    /// Flushes and syncs the file. Later writes fail; closing again is a no-op.
    pub async fn close(&self) -> Result<()> {
        let mut guard = self.file.lock().await;
        if let Some(mut file) = guard.take() {
            file.flush().await.map_err(|source| self.error(source))?;
            file.sync_all().await.map_err(|source| self.error(source))?;
            debug!(
                path = %self.path.display(),
                writes = self.writes(),
                bytes = self.bytes_written(),
                "closed result sink"
            );
        }
        Ok(())
    }

    /// Returns true once the sink has been closed.
    pub async fn is_closed(&self) -> bool {
        self.file.lock().await.is_none()
    }

    /// Path of the result file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of completed writes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Total bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes.load(Ordering::SeqCst)
    }

    fn error(&self, source: std::io::Error) -> RuntimeError {
        RuntimeError::Sink {
            path: self.path.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "old run\n").unwrap();

        let sink = ResultSink::open(&OutputConfig::new(&path)).await.unwrap();
        sink.write("new\n").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[tokio::test]
    async fn test_open_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        std::fs::write(&path, "old run\n").unwrap();

        let config = OutputConfig::new(&path).with_append(true);
        let sink = ResultSink::open(&config).await.unwrap();
        sink.write("new\n").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old run\nnew\n");
    }

    #[tokio::test]
    async fn test_open_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out/results.csv");

        let sink = ResultSink::open(&OutputConfig::new(&path)).await.unwrap();
        sink.close().await.unwrap();

        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_write_visible_before_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let sink = ResultSink::open(&OutputConfig::new(&path)).await.unwrap();
        sink.write("host1\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "host1\n");
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_write_after_close_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let sink = ResultSink::open(&OutputConfig::new(&path)).await.unwrap();
        sink.close().await.unwrap();
        assert!(sink.is_closed().await);

        let result = sink.write("late\n").await;
        assert!(matches!(result, Err(RuntimeError::SinkClosed)));

        // Second close is a no-op.
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_write_counts_without_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let sink = ResultSink::open(&OutputConfig::new(&path)).await.unwrap();
        sink.write("").await.unwrap();

        assert_eq!(sink.writes(), 1);
        assert_eq!(sink.bytes_written(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_writes_do_not_interleave() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let sink = Arc::new(ResultSink::open(&OutputConfig::new(&path)).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..32 {
            let sink = Arc::clone(&sink);
            handles.push(tokio::spawn(async move {
                let line = format!("{}\n", format!("record-{:02}-", i).repeat(50));
                sink.write(&line).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 32);
        for line in lines {
            let prefix = &line[..10];
            assert_eq!(line, prefix.repeat(50));
        }
        assert_eq!(sink.writes(), 32);
    }

    #[tokio::test]
    async fn test_open_fails_on_directory() {
        let dir = tempdir().unwrap();

        let result = ResultSink::open(&OutputConfig::new(dir.path())).await;
        assert!(matches!(result, Err(RuntimeError::Sink { .. })));
    }
}
