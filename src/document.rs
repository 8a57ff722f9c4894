//! Document persistence
//!
//! The host resolves where documents may be written (e.g. the open project
//! root) and exposes it through [`DocumentSink`]. Absence of a target is a
//! reported error, never a crash. Write failures are classified so the
//! orchestrator can surface a plain-language message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info};

use crate::sanitize;

/// Errors from writing a document
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("No writable location is available; open a project first")]
    NoLocation,

    #[error("Permission denied writing {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Not enough disk space to write {}", .0.display())]
    OutOfSpace(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// Host capability that resolves the external writable location
pub trait DocumentSink: Send + Sync {
    /// Target directory for saved documents, if one exists
    fn target_dir(&self) -> Option<PathBuf>;
}

/// Sink backed by a fixed directory, e.g. the open project root
#[derive(Debug, Clone)]
pub struct WorkspaceSink {
    root: PathBuf,
}

impl WorkspaceSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DocumentSink for WorkspaceSink {
    fn target_dir(&self) -> Option<PathBuf> {
        Some(self.root.clone())
    }
}

/// Sink for hosts with no writable location
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DocumentSink for NullSink {
    fn target_dir(&self) -> Option<PathBuf> {
        None
    }
}

/// Write `content` under the sink's target directory
///
/// The file name is normalized first; content is written verbatim, having
/// already been sanitized at ingestion. Returns the path written.
pub fn write_document(
    sink: &dyn DocumentSink,
    file_name: &str,
    content: &str,
) -> Result<PathBuf, DocumentError> {
    let dir = sink.target_dir().ok_or(DocumentError::NoLocation)?;
    let name = sanitize::sanitize_file_name(file_name);
    let path = dir.join(name);
    debug!(path = %path.display(), bytes = content.len(), "write_document: writing");

    match std::fs::write(&path, content) {
        Ok(()) => {
            info!(path = %path.display(), "write_document: saved");
            Ok(path)
        }
        Err(e) => Err(match e.kind() {
            io::ErrorKind::PermissionDenied => DocumentError::PermissionDenied(path),
            io::ErrorKind::StorageFull => DocumentError::OutOfSpace(path),
            _ => DocumentError::Io { path, source: e },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_document_success() {
        let dir = TempDir::new().unwrap();
        let sink = WorkspaceSink::new(dir.path());

        let path = write_document(&sink, "my prd", "# Requirements").unwrap();

        assert_eq!(path.file_name().unwrap(), "my prd.md");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Requirements");
    }

    #[test]
    fn test_write_document_sanitizes_name() {
        let dir = TempDir::new().unwrap();
        let sink = WorkspaceSink::new(dir.path());

        let path = write_document(&sink, "../../../etc/passwd", "x").unwrap();

        assert_eq!(path.file_name().unwrap(), "etcpasswd.md");
        assert!(path.starts_with(dir.path()));
    }

    #[test]
    fn test_write_document_no_location() {
        let err = write_document(&NullSink, "prd", "x").unwrap_err();
        assert!(matches!(err, DocumentError::NoLocation));
        assert!(err.to_string().contains("No writable location"));
    }

    #[test]
    fn test_write_document_missing_directory_is_classified() {
        let sink = WorkspaceSink::new("/nonexistent/definitely/missing");
        let err = write_document(&sink, "prd", "x").unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }
}
