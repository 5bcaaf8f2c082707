//! Overwrite-guarded file creation.

use std::fs;
use std::path::Path;

use crate::error::WriteError;

/// Result of a successful [`FileWriter::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New file created.
    Created,
    /// Existing file replaced (overwrite allowed).
    Overwritten,
    /// Existing file already had identical content.
    Unchanged,
    /// Validation passed; nothing was written (dry run).
    Skipped,
}

/// Writes files without clobbering differing content.
///
/// - Identical content already on disk is a no-op.
/// - Different content is a [`WriteError::Conflict`] unless overwriting is allowed.
/// - In dry-run mode all checks run but nothing on disk changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileWriter {
    overwrite: bool,
    dry_run: bool,
}

impl FileWriter {
    /// Create a writer.
    #[must_use]
    pub fn new(overwrite: bool) -> Self {
        Self {
            overwrite,
            dry_run: false,
        }
    }

    /// Validate writes without touching disk.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Write `content` to `path`, creating parent directories as needed.
    pub fn write(&self, path: &Path, content: &[u8]) -> Result<WriteOutcome, WriteError> {
        let exists = path.exists();
        if exists {
            let old_content = fs::read(path)?;
            if old_content == content {
                return Ok(WriteOutcome::Unchanged);
            }
            if !self.overwrite {
                return Err(WriteError::Conflict {
                    path: path.to_path_buf(),
                });
            }
        }

        if self.dry_run {
            return Ok(WriteOutcome::Skipped);
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        tracing::debug!("wrote {} bytes to {}", content.len(), path.display());

        Ok(if exists {
            WriteOutcome::Overwritten
        } else {
            WriteOutcome::Created
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("deep/nested/a.png");

        let outcome = FileWriter::new(false).write(&path, b"data").unwrap();

        assert_eq!(outcome, WriteOutcome::Created);
        assert_eq!(fs::read(&path).unwrap(), b"data");
    }

    #[test]
    fn test_identical_content_is_noop() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        fs::write(&path, b"same").unwrap();

        let outcome = FileWriter::new(false).write(&path, b"same").unwrap();
        assert_eq!(outcome, WriteOutcome::Unchanged);
    }

    #[test]
    fn test_conflict_without_overwrite_leaves_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        fs::write(&path, b"old").unwrap();

        let err = FileWriter::new(false).write(&path, b"new").unwrap_err();

        assert!(matches!(err, WriteError::Conflict { ref path } if path.ends_with("a.png")));
        assert!(err.to_string().contains("--overwrite"));
        assert_eq!(fs::read(&path).unwrap(), b"old");
    }

    #[test]
    fn test_overwrite_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        fs::write(&path, b"old").unwrap();

        let outcome = FileWriter::new(true).write(&path, b"new").unwrap();

        assert_eq!(outcome, WriteOutcome::Overwritten);
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("images/a.png");

        let outcome = FileWriter::new(false)
            .dry_run(true)
            .write(&path, b"data")
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Skipped);
        assert!(!tmp.path().join("images").exists());
    }

    #[test]
    fn test_dry_run_still_reports_conflicts() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        fs::write(&path, b"old").unwrap();

        let result = FileWriter::new(false).dry_run(true).write(&path, b"new");
        assert!(matches!(result, Err(WriteError::Conflict { .. })));
    }
}
