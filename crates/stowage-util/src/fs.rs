use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Read a file to string, replacing invalid UTF-8 sequences with the
/// replacement character.
///
/// Manifest files occasionally arrive with stray bytes (BOMs, editor
/// artifacts); a lossy read lets the JSON parser report the real problem
/// instead of failing on encoding.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Atomically replace a file's contents by writing a sibling temp file and
/// renaming it into place.
///
/// The file ends up with either the old contents or the new contents, never a
/// partial write. The temp file lives in the same directory so the rename
/// stays on one filesystem.
///
/// # Errors
/// Returns an error if the write or rename fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or(Path::new("."));
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let temp_path = parent.join(format!(
        ".{}.{}.{}.tmp",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
        std::process::id(),
        seq
    ));

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        // Windows rename fails when the target exists; fall back to copy.
        if cfg!(windows) {
            fs::copy(&temp_path, path)?;
            let _ = fs::remove_file(&temp_path);
            return Ok(());
        }
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}
