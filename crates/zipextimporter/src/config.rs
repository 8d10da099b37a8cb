//! Importer configuration: the excluded-module and version-bound-module
//! sets, the platform suffix lists, and the disk-cache root override.
//!
//! Configuration is an explicit struct rather than hidden global state;
//! a process-wide default instance backs the free-function
//! administrative API for hosts that want the set-once/read-often
//! usage pattern.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;

use memimport::ImportError;

use crate::suffixes::SuffixTable;

/// Version tag used to disambiguate version-bound binaries when the
/// host does not supply one.
pub const DEFAULT_VERSION_TAG: &str = "313";

#[cfg(windows)]
fn platform_extension_suffixes() -> Vec<String> {
    vec![".pyd".to_string()]
}

#[cfg(not(windows))]
fn platform_extension_suffixes() -> Vec<String> {
    vec![".so".to_string()]
}

#[cfg(windows)]
const SHARED_LIB_SUFFIX: &str = ".dll";

#[cfg(not(windows))]
const SHARED_LIB_SUFFIX: &str = ".so";

pub struct ImportConfig {
    extension_suffixes: Vec<String>,
    shared_lib_suffix: String,
    version_tag: String,
    excluded: RwLock<BTreeSet<String>>,
    version_bound: RwLock<BTreeSet<String>>,
    cache_root: RwLock<Option<PathBuf>>,
    // Search tables are fixed once built; suffix inputs are immutable.
    default_table: OnceCell<SuffixTable>,
    versioned_table: OnceCell<SuffixTable>,
}

impl ImportConfig {
    pub fn new() -> Self {
        Self::with_suffixes(
            platform_extension_suffixes(),
            SHARED_LIB_SUFFIX,
            DEFAULT_VERSION_TAG,
        )
    }

    /// Build a configuration with explicit suffix lists. The first
    /// extension suffix is the canonical one, trusted without
    /// signature validation.
    pub fn with_suffixes(
        extension_suffixes: Vec<String>,
        shared_lib_suffix: &str,
        version_tag: &str,
    ) -> Self {
        Self {
            extension_suffixes,
            shared_lib_suffix: shared_lib_suffix.to_string(),
            version_tag: version_tag.to_string(),
            excluded: RwLock::new(BTreeSet::new()),
            version_bound: RwLock::new(BTreeSet::new()),
            cache_root: RwLock::new(None),
            default_table: OnceCell::new(),
            versioned_table: OnceCell::new(),
        }
    }

    pub fn extension_suffixes(&self) -> &[String] {
        &self.extension_suffixes
    }

    pub fn shared_lib_suffix(&self) -> &str {
        &self.shared_lib_suffix
    }

    pub fn version_tag(&self) -> &str {
        &self.version_tag
    }

    pub(crate) fn default_table(&self) -> &SuffixTable {
        self.default_table.get_or_init(|| SuffixTable::build(self))
    }

    pub(crate) fn versioned_table(&self) -> &SuffixTable {
        self.versioned_table
            .get_or_init(|| SuffixTable::build_versioned(self))
    }

    /// Add modules that must never be loaded from memory; they are
    /// materialized to the disk cache and loaded conventionally.
    /// Accepts fully-qualified or bare names. No state is mutated when
    /// any name is invalid.
    pub fn add_excluded_modules<I, S>(&self, names: I) -> Result<(), ImportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = validate_names(names)?;
        self.excluded.write().extend(names);
        Ok(())
    }

    /// Add modules whose binary filename carries the version tag. Only
    /// the last dotted component of each name is recorded.
    pub fn add_version_bound_modules<I, S>(&self, names: I) -> Result<(), ImportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = validate_names(names)?;
        let leaves = names
            .into_iter()
            .map(|name| match name.rfind('.') {
                Some(idx) => name[idx + 1..].to_string(),
                None => name,
            })
            .collect::<Vec<_>>();
        self.version_bound.write().extend(leaves);
        Ok(())
    }

    pub fn excluded_modules(&self) -> Vec<String> {
        self.excluded.read().iter().cloned().collect()
    }

    pub fn version_bound_modules(&self) -> Vec<String> {
        self.version_bound.read().iter().cloned().collect()
    }

    pub fn is_excluded(&self, fullname: &str, leaf: &str) -> bool {
        let excluded = self.excluded.read();
        excluded.contains(fullname) || excluded.contains(leaf)
    }

    pub fn is_version_bound(&self, leaf: &str) -> bool {
        self.version_bound.read().contains(leaf)
    }

    /// Override the disk-cache root (takes precedence over the
    /// `EGGS_CACHE` environment variable).
    pub fn set_cache_root(&self, root: PathBuf) {
        *self.cache_root.write() = Some(root);
    }

    pub fn cache_root_override(&self) -> Option<PathBuf> {
        self.cache_root.read().clone()
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_names<I, S>(names: I) -> Result<Vec<String>, ImportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = Vec::new();
    for name in names {
        let name = name.as_ref();
        if name.trim().is_empty() {
            return Err(ImportError::Configuration(
                "module name must not be empty".to_string(),
            ));
        }
        out.push(name.to_string());
    }
    Ok(out)
}

static DEFAULT_CONFIG: Lazy<Arc<ImportConfig>> = Lazy::new(|| Arc::new(ImportConfig::new()));

/// The process-wide default configuration, shared by importers that are
/// built without an explicit one.
pub fn default_config() -> Arc<ImportConfig> {
    DEFAULT_CONFIG.clone()
}

/// Add to the process-wide excluded-module set.
pub fn set_excluded_modules<I, S>(names: I) -> Result<(), ImportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DEFAULT_CONFIG.add_excluded_modules(names)
}

/// Add to the process-wide version-bound-module set (leaf names only).
pub fn set_version_bound_modules<I, S>(names: I) -> Result<(), ImportError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    DEFAULT_CONFIG.add_version_bound_modules(names)
}

pub fn excluded_modules() -> Vec<String> {
    DEFAULT_CONFIG.excluded_modules()
}

pub fn version_bound_modules() -> Vec<String> {
    DEFAULT_CONFIG.version_bound_modules()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_bound_names_keep_only_the_leaf() {
        let config = ImportConfig::new();
        config
            .add_version_bound_modules(["win32.lib.pywintypes", "pythoncom"])
            .expect("add");
        assert_eq!(
            config.version_bound_modules(),
            vec!["pythoncom".to_string(), "pywintypes".to_string()]
        );
        assert!(config.is_version_bound("pywintypes"));
        assert!(!config.is_version_bound("win32.lib.pywintypes"));
    }

    #[test]
    fn excluded_matches_full_or_bare_name() {
        let config = ImportConfig::new();
        config
            .add_excluded_modules(["pkg.native", "vtk"])
            .expect("add");
        assert!(config.is_excluded("pkg.native", "native"));
        assert!(config.is_excluded("any.vtk", "vtk"));
        assert!(!config.is_excluded("pkg.other", "other"));
    }

    #[test]
    fn empty_names_are_rejected_without_mutation() {
        let config = ImportConfig::new();
        let err = config
            .add_excluded_modules(["good", "  "])
            .expect_err("empty name");
        assert!(matches!(err, ImportError::Configuration(_)));
        assert!(config.excluded_modules().is_empty());
    }
}
