//! Whole-file replacement for files read by another process.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, StorageError};

/// Distinguishes temp files of writers in the same process.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Replace `path` with `content` using write-to-temp-then-rename.
///
/// A concurrent reader sees either the previous file or the new one, never
/// a partial write. The temp file lives next to the target so the rename
/// stays on one filesystem; each call gets its own temp file, so
/// concurrent writers never interleave bytes.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let (parent, name) = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => (parent, name),
        _ => {
            return Err(StorageError::AtomicWriteFailed {
                path: path.to_path_buf(),
                reason: "path has no parent directory or file name".to_string(),
            });
        }
    };
    fs::create_dir_all(parent)?;

    let temp_path = parent.join(format!(
        ".{}.{}.{}.tmp",
        name.to_string_lossy(),
        std::process::id(),
        WRITE_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    let written = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&temp_path)
        .and_then(|mut file| {
            file.write_all(content)?;
            file.sync_all()
        });
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        StorageError::AtomicWriteFailed {
            path: path.to_path_buf(),
            reason: format!("rename failed: {}", e),
        }
    })
}
