//! Atomic file replacement.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tracing::debug;
use uuid::Uuid;

use crate::error::SslError;

/// Write `content` to `path` so readers see either the old file or the
/// complete new one, never a partial write.
///
/// The content goes to a uniquely named sibling temp file (created with
/// `O_EXCL`), is synced, gets `mode` applied, and is renamed over `path`.
/// The temp file is removed if any step fails.
pub fn write_atomic(path: &Path, content: &str, mode: u32) -> Result<(), SslError> {
    let write_error = |message: String| SslError::Write {
        path: path.to_path_buf(),
        message,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| write_error("path has no parent directory".to_string()))?;
    if !parent.is_dir() {
        return Err(write_error(format!(
            "directory {} does not exist",
            parent.display()
        )));
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        Uuid::new_v4().simple()
    );
    let temp_path = parent.join(temp_name);

    let result = (|| {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .map_err(|e| write_error(format!("Failed to create temp file: {}", e)))?;

        file.write_all(content.as_bytes())
            .map_err(|e| write_error(format!("Failed to write content: {}", e)))?;
        file.sync_all()
            .map_err(|e| write_error(format!("Failed to sync file: {}", e)))?;

        fs::set_permissions(&temp_path, fs::Permissions::from_mode(mode))
            .map_err(|e| write_error(format!("Failed to set permissions: {}", e)))?;

        fs::rename(&temp_path, path)
            .map_err(|e| write_error(format!("Failed to rename temp file: {}", e)))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    } else {
        debug!(path = %path.display(), bytes = content.len(), "File written");
    }

    result
}

/// Remove a file, returning whether it existed.
pub fn remove_if_exists(path: &Path) -> Result<bool, SslError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SslError::Write {
            path: path.to_path_buf(),
            message: format!("Failed to remove file: {}", e),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app-ssl.conf");

        write_atomic(&path, "server {}\n", 0o644).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "server {}\n");
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, "new", 0o600).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_atomic_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("file.conf");

        let result = write_atomic(&path, "x", 0o644);
        assert!(matches!(result, Err(SslError::Write { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file");
        fs::write(&path, "x").unwrap();

        assert!(remove_if_exists(&path).unwrap());
        assert!(!remove_if_exists(&path).unwrap());
    }
}
