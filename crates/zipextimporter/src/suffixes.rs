//! Priority-ordered suffix search tables.
//!
//! The table enumerates every filename shape a module candidate may
//! take inside an archive, in the exact order the host platform's own
//! module discovery uses: package-init binary forms, flat binary forms,
//! then the source forms. Extension modules shadow same-named source
//! files because their entries sort first.

use crate::config::ImportConfig;

pub const SOURCE_SUFFIX: &str = ".py";
pub const COMPILED_SUFFIX: &str = ".pyc";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuffixKind {
    /// Binary extension form. `verify` marks suffixes that require the
    /// signature validator (the canonical platform suffix is trusted:
    /// the platform loader rejects malformed images itself).
    Extension { verify: bool },
    Source,
}

#[derive(Clone, Debug)]
pub struct SearchEntry {
    /// Appended to `prefix + leaf` to form a candidate entry path.
    /// Package-init suffixes start with the archive path separator.
    pub suffix: String,
    pub package_init: bool,
    pub kind: SuffixKind,
}

impl SearchEntry {
    fn extension(suffix: String, package_init: bool, verify: bool) -> Self {
        Self {
            suffix,
            package_init,
            kind: SuffixKind::Extension { verify },
        }
    }

    fn source(suffix: String, package_init: bool) -> Self {
        Self {
            suffix,
            package_init,
            kind: SuffixKind::Source,
        }
    }
}

pub struct SuffixTable {
    entries: Vec<SearchEntry>,
}

impl SuffixTable {
    /// Binary suffixes in priority order with their validation flags:
    /// canonical platform suffixes first (trusted), then the synthetic
    /// shared-library suffix and the bare-filename form (validated).
    fn binary_suffixes(config: &ImportConfig) -> Vec<(String, bool)> {
        let mut suffixes: Vec<(String, bool)> = config
            .extension_suffixes()
            .iter()
            .map(|suffix| (suffix.clone(), false))
            .collect();
        let shared = config.shared_lib_suffix();
        if !suffixes.iter().any(|(suffix, _)| suffix == shared) {
            suffixes.push((shared.to_string(), true));
        }
        suffixes.push((String::new(), true));
        suffixes
    }

    fn build_inner(config: &ImportConfig, version_tag: Option<&str>) -> Self {
        let binary = Self::binary_suffixes(config);
        let mut entries = Vec::new();
        for (suffix, verify) in &binary {
            entries.push(SearchEntry::extension(
                format!("/__init__{suffix}"),
                true,
                *verify,
            ));
        }
        for (suffix, verify) in &binary {
            if let Some(tag) = version_tag {
                entries.push(SearchEntry::extension(
                    format!("{tag}{suffix}"),
                    false,
                    *verify,
                ));
            }
            entries.push(SearchEntry::extension(suffix.clone(), false, *verify));
        }
        entries.push(SearchEntry::source(
            format!("/__init__{COMPILED_SUFFIX}"),
            true,
        ));
        entries.push(SearchEntry::source(format!("/__init__{SOURCE_SUFFIX}"), true));
        entries.push(SearchEntry::source(COMPILED_SUFFIX.to_string(), false));
        entries.push(SearchEntry::source(SOURCE_SUFFIX.to_string(), false));
        Self { entries }
    }

    /// The default table.
    pub fn build(config: &ImportConfig) -> Self {
        Self::build_inner(config, None)
    }

    /// The table used for version-bound names: each flat binary suffix
    /// is immediately preceded by its version-tagged counterpart, so a
    /// tagged binary wins over an untagged one of the same shape.
    pub fn build_versioned(config: &ImportConfig) -> Self {
        Self::build_inner(config, Some(config.version_tag()))
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }
}
