//! Persistence of the winning key material.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

/// Destination for the key material of a winning match.
///
/// Implementations must be safe to call from any worker thread; the search
/// guarantees at most one call per run.
pub trait ResultSink: Send + Sync {
    fn persist(&self, key_material: &[u8]) -> Result<(), SinkError>;
}

/// Appends key material to a file, creating it if needed.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for FileSink {
    fn persist(&self, key_material: &[u8]) -> Result<(), SinkError> {
        let wrap = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(wrap)?;
        file.write_all(key_material).map_err(wrap)?;
        file.flush().map_err(wrap)?;

        info!(path = %self.path.display(), bytes = key_material.len(), "persisted private key");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_sink_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("private.key");
        let sink = FileSink::new(&path);

        sink.persist(&[1, 2, 3]).unwrap();
        sink.persist(&[4]).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_file_sink_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("private.key");
        let sink = FileSink::new(&path);

        let err = sink.persist(&[1]).unwrap_err();
        assert!(err.to_string().contains("private.key"), "{}", err);
    }
}
