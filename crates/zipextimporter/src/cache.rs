//! Disk cache for excluded extension modules.
//!
//! Some binary modules cannot be loaded from memory (they open files
//! relative to themselves, or register their own path with the OS).
//! Those are written out under a cache directory and loaded from disk
//! instead.

use std::env;
use std::fs;
use std::path::PathBuf;

use crate::archive::ArchiveHandle;
use crate::config::ImportConfig;
use crate::error::ZipImportError;

/// Directory name used when no explicit cache root is configured.
const CACHE_DIR_NAME: &str = "Eggs-Cache";

/// Environment variable overriding the cache root.
const CACHE_ENV_VAR: &str = "EGGS_CACHE";

/// Pick the cache root: configured override first, then the
/// environment, then `Eggs-Cache` next to the running executable.
pub fn cache_root(config: &ImportConfig) -> Result<PathBuf, ZipImportError> {
    if let Some(root) = config.cache_root_override() {
        return Ok(root);
    }
    if let Some(root) = env::var_os(CACHE_ENV_VAR) {
        if !root.is_empty() {
            return Ok(PathBuf::from(root));
        }
    }
    let exe = env::current_exe()?;
    let install_root = exe.parent().ok_or_else(|| ZipImportError::Archive {
        archive: exe.clone(),
        reason: "executable has no parent directory".to_string(),
    })?;
    Ok(install_root.join(CACHE_DIR_NAME))
}

/// Extract `entry` from the archive into the cache and return the
/// on-disk path. The destination is `<root>/<stem>-tmp/<entry>`, where
/// `<stem>` is the archive's file stem. An existing file is reused
/// as-is, so repeated imports of an excluded module stay cheap.
pub fn materialize(
    archive: &ArchiveHandle,
    config: &ImportConfig,
    entry: &str,
) -> Result<PathBuf, ZipImportError> {
    let stem = archive
        .root()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let mut dest = cache_root(config)?.join(format!("{stem}-tmp"));
    for part in entry.split('/') {
        dest.push(part);
    }

    if dest.is_file() {
        memimport::verbose!(1, "# reusing cached {}", dest.display());
        return Ok(dest);
    }

    let data = archive.read(entry)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&dest, data)?;
    memimport::verbose!(1, "# extracted {entry} to {}", dest.display());
    Ok(dest)
}
