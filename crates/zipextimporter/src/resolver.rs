//! Entry resolution: map a dotted module name to the archive entry
//! that should back it, in platform discovery order.

use memimport::export_hook_name;

use crate::archive::ArchiveHandle;
use crate::config::ImportConfig;
use crate::error::ZipImportError;
use crate::suffixes::SuffixKind;
use crate::validate::is_genuine_extension;

/// How a resolved candidate is backed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CandidateKind {
    /// Binary extension entry. `verify` records whether it matched a
    /// suffix that required signature validation.
    Extension { verify: bool },
    /// Plain or compiled source entry.
    Source,
    /// Implicit (namespace) package: a directory marker with no payload
    /// of its own, only a submodule search location.
    PackageDirectory,
}

/// Result of resolving a dotted name against one archive.
#[derive(Clone, Debug)]
pub struct ModuleCandidate {
    /// Entry path inside the archive (directory markers end in `/`).
    pub path: String,
    pub kind: CandidateKind,
    pub is_package: bool,
    /// Set once the entry has been extracted to the disk cache.
    pub materialized: bool,
}

/// Locate the highest-priority entry for `fullname` under `prefix`
/// inside the archive. Binary matches under validated suffixes must
/// contain the init symbol; a failed validation skips that entry and
/// the scan continues with lower-priority candidates. Results are
/// cached per (archive, prefixed name) for the process lifetime.
pub fn resolve(
    archive: &ArchiveHandle,
    config: &ImportConfig,
    prefix: &str,
    fullname: &str,
) -> Result<ModuleCandidate, ZipImportError> {
    let cache_key = format!("{prefix}{fullname}");
    if let Some(cached) = archive.cached_resolution(&cache_key) {
        return cached.ok_or_else(|| ZipImportError::NotFound(fullname.to_string()));
    }

    let resolved = scan(archive, config, prefix, fullname)?;
    archive.store_resolution(cache_key, resolved.clone());
    resolved.ok_or_else(|| ZipImportError::NotFound(fullname.to_string()))
}

fn scan(
    archive: &ArchiveHandle,
    config: &ImportConfig,
    prefix: &str,
    fullname: &str,
) -> Result<Option<ModuleCandidate>, ZipImportError> {
    let leaf = fullname.rsplit('.').next().unwrap_or(fullname);
    let table = if config.is_version_bound(leaf) {
        config.versioned_table()
    } else {
        config.default_table()
    };
    let init_symbol = export_hook_name(fullname);

    for entry in table.entries() {
        let path = format!("{prefix}{leaf}{}", entry.suffix);
        if !archive.contains(&path) {
            continue;
        }
        if let SuffixKind::Extension { verify: true } = entry.kind {
            let data = archive.read(&path)?;
            if !is_genuine_extension(&data, &init_symbol) {
                memimport::verbose!(
                    2,
                    "# found {path} in zipfile {}, but it is not an extension",
                    archive.label()
                );
                continue;
            }
        }
        memimport::verbose!(2, "# found {path} in zipfile {}", archive.label());
        let kind = match entry.kind {
            SuffixKind::Extension { verify } => CandidateKind::Extension { verify },
            SuffixKind::Source => CandidateKind::Source,
        };
        return Ok(Some(ModuleCandidate {
            path,
            kind,
            is_package: entry.package_init,
            materialized: false,
        }));
    }

    // No payload entry: an implicit-directory marker still makes the
    // name importable as a namespace package.
    let marker = format!("{prefix}{leaf}/");
    if archive.contains(&marker) {
        memimport::verbose!(2, "# found {marker} in zipfile {}", archive.label());
        return Ok(Some(ModuleCandidate {
            path: marker,
            kind: CandidateKind::PackageDirectory,
            is_package: true,
            materialized: false,
        }));
    }
    Ok(None)
}
