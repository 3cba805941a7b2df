//! File helpers shared by the on-disk stores and the export sink.
//!
//! Writes go to a `<name>.tmp` sibling that is flushed and then renamed over
//! the target, so readers never observe a half-written file.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Serialize `data` as pretty JSON and write it with [`atomic_write`].
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let bytes = serde_json::to_vec_pretty(data).map_err(io::Error::other)?;
    atomic_write(path, &bytes)
}

/// Replace `path` with `data`, creating parent directories as needed.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    let mut file = File::create(tmp)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(tmp, path)
}

/// Read and deserialize a JSON file. A missing file is `Ok(None)`; malformed
/// content is an `InvalidData` error.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
