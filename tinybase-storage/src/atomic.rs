//! The durability contract of §4.5: every artefact is written in full to a
//! sibling temporary file in the same directory, flushed (and optionally
//! fsynced) to the OS, then atomically renamed over the target. After a
//! crash the target holds either the pre-write or the post-write bytes,
//! never a mixture, because `rename` is atomic on both POSIX and Windows
//! for an existing destination.

use std::io;
use std::path::Path;

use tempfile::Builder;

use tinybase_error::Error;

/// Writes `contents` to `path` via the sibling-temp-file-then-rename
/// dance. `fsync` controls whether the temp file's bytes are flushed to
/// disk (not just the OS page cache) before the rename; tests that don't
/// care about crash-safety can turn it off for speed (§10.3).
pub(crate) fn atomic_write(path: &Path, contents: &[u8], fsync: bool) -> Result<(), Error> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = Builder::new()
        .prefix(".tinybase-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(Error::IoError)?;

    use std::io::Write;
    tmp.write_all(contents).map_err(Error::IoError)?;
    if fsync {
        tmp.as_file().sync_all().map_err(Error::IoError)?;
    }

    tmp.persist(path)
        .map_err(|e| Error::IoError(io::Error::new(e.error.kind(), e.error)))?;
    Ok(())
}
