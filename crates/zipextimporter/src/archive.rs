//! Open zip archives: normalized directory listings, implicit-directory
//! fix-up, entry access, and the process-wide handle cache.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use zip::ZipArchive;

use crate::error::ZipImportError;
use crate::resolver::ModuleCandidate;

/// Normalize an archive entry path: forward slashes only, no leading
/// separator.
pub(crate) fn normalize_entry_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_start_matches('/').to_string()
}

/// An open archive container. Owns the directory listing (after
/// fix-up), synchronized access to the underlying zip reader, and the
/// per-archive resolution cache. Contents are treated as immutable for
/// the lifetime of the process.
pub struct ArchiveHandle {
    root: PathBuf,
    label: String,
    // Normalized entry path -> name as stored in the zip directory,
    // or None for synthesized directory markers.
    files: BTreeMap<String, Option<String>>,
    zip: Mutex<ZipArchive<File>>,
    resolve_cache: RwLock<HashMap<String, Option<ModuleCandidate>>>,
}

static ARCHIVES: Lazy<Mutex<HashMap<PathBuf, Arc<ArchiveHandle>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

impl ArchiveHandle {
    /// Open the archive at `root`, reusing the process-wide handle for
    /// an already-open root.
    pub fn open(root: &Path) -> Result<Arc<Self>, ZipImportError> {
        let key = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        if let Some(handle) = ARCHIVES.lock().get(&key) {
            return Ok(handle.clone());
        }

        let file = File::open(root).map_err(|_| ZipImportError::NotArchive(root.to_path_buf()))?;
        let zip = ZipArchive::new(file)
            .map_err(|_| ZipImportError::NotArchive(root.to_path_buf()))?;
        let mut files: BTreeMap<String, Option<String>> = BTreeMap::new();
        for name in zip.file_names() {
            files.insert(normalize_entry_path(name), Some(name.to_string()));
        }
        fix_up_directory_markers(&mut files);

        let handle = Arc::new(Self {
            root: root.to_path_buf(),
            label: root.display().to_string(),
            files,
            zip: Mutex::new(zip),
            resolve_cache: RwLock::new(HashMap::new()),
        });
        ARCHIVES.lock().insert(key, handle.clone());
        Ok(handle)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Archive root identifier used in origin strings and diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn entry_names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Read the raw bytes of an entry. Directory markers have no
    /// payload and cannot be read.
    pub fn read(&self, path: &str) -> Result<Vec<u8>, ZipImportError> {
        let normalized = normalize_entry_path(path);
        let stored = match self.files.get(&normalized) {
            Some(Some(stored)) => stored.clone(),
            Some(None) => {
                return Err(ZipImportError::Archive {
                    archive: self.root.clone(),
                    reason: format!("'{normalized}' is a directory, not a file entry"),
                });
            }
            None => {
                return Err(ZipImportError::Archive {
                    archive: self.root.clone(),
                    reason: format!("no entry named '{normalized}'"),
                });
            }
        };
        let mut zip = self.zip.lock();
        let mut entry = zip.by_name(&stored).map_err(|err| ZipImportError::Archive {
            archive: self.root.clone(),
            reason: err.to_string(),
        })?;
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        Ok(data)
    }

    pub(crate) fn cached_resolution(&self, key: &str) -> Option<Option<ModuleCandidate>> {
        self.resolve_cache.read().get(key).cloned()
    }

    pub(crate) fn store_resolution(&self, key: String, candidate: Option<ModuleCandidate>) {
        self.resolve_cache.write().insert(key, candidate);
    }

    pub(crate) fn clear_resolution_cache(&self) {
        self.resolve_cache.write().clear();
    }
}

/// Synthesize missing implicit-directory markers. Some archive writers
/// omit directory entries for intermediate package directories, which
/// breaks namespace-package discovery. For every entry, ancestor
/// directories are walked deepest-first and a null marker is inserted
/// for each one not already present; the walk stops at the first
/// ancestor already covered. Idempotent; never touches real entries.
fn fix_up_directory_markers(files: &mut BTreeMap<String, Option<String>>) {
    let leaves: Vec<String> = files.keys().cloned().collect();
    for name in leaves {
        let mut path = name.trim_end_matches('/');
        while let Some(idx) = path.rfind('/') {
            path = &path[..idx];
            let marker = format!("{path}/");
            if files.contains_key(&marker) {
                break;
            }
            files.insert(marker, None);
        }
    }
}

/// Drop all process-wide archive handles and their resolution caches.
/// The next open re-reads the archive directory.
pub fn invalidate_caches() {
    let mut archives = ARCHIVES.lock();
    for handle in archives.values() {
        handle.clear_resolution_cache();
    }
    archives.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(names: &[&str]) -> BTreeMap<String, Option<String>> {
        names
            .iter()
            .map(|name| (name.to_string(), Some(name.to_string())))
            .collect()
    }

    #[test]
    fn fix_up_synthesizes_all_missing_ancestors() {
        let mut files = listing(&["a/b/c/mod.py", "top.py"]);
        fix_up_directory_markers(&mut files);
        assert!(files.contains_key("a/"));
        assert!(files.contains_key("a/b/"));
        assert!(files.contains_key("a/b/c/"));
        assert_eq!(files.get("a/"), Some(&None));
        // Real entries are untouched.
        assert_eq!(
            files.get("a/b/c/mod.py"),
            Some(&Some("a/b/c/mod.py".to_string()))
        );
    }

    #[test]
    fn fix_up_is_idempotent() {
        let mut files = listing(&["pkg/sub/mod.py", "pkg/data.bin"]);
        fix_up_directory_markers(&mut files);
        let once = files.clone();
        fix_up_directory_markers(&mut files);
        assert_eq!(files, once);
    }

    #[test]
    fn fix_up_keeps_existing_real_markers() {
        let mut files = listing(&["pkg/", "pkg/mod.py"]);
        fix_up_directory_markers(&mut files);
        // The writer-provided marker keeps its stored name.
        assert_eq!(files.get("pkg/"), Some(&Some("pkg/".to_string())));
    }

    #[test]
    fn normalize_handles_backslashes_and_leading_separators() {
        assert_eq!(normalize_entry_path(r"pkg\sub\mod.pyd"), "pkg/sub/mod.pyd");
        assert_eq!(normalize_entry_path("/pkg/mod.py"), "pkg/mod.py");
    }
}
