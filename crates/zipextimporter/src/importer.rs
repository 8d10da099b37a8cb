//! The archive-backed importer: resolves dotted names inside one
//! archive (or a subdirectory of it) and dispatches each candidate to
//! the in-memory loader, the disk-cache path, or a plain module record.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use memimport::{
    BackingKind, FileImporter, ImportError, MemoryImporter, Module, ModuleLoader, ModuleSpec,
    export_hook_name, global_registry,
};

use crate::archive::{ArchiveHandle, normalize_entry_path};
use crate::cache;
use crate::config::{ImportConfig, default_config};
use crate::error::ZipImportError;
use crate::resolver::{CandidateKind, ModuleCandidate, resolve};

/// Importer rooted at one archive, optionally inside a subdirectory of
/// it. Cloning is cheap; clones share the archive handle, the
/// configuration, and any loader overrides.
#[derive(Clone)]
pub struct ZipExtensionImporter {
    archive: Arc<ArchiveHandle>,
    /// Normalized subdirectory prefix within the archive; empty or
    /// ending in `/`.
    prefix: String,
    config: Arc<ImportConfig>,
    memory_importer: Option<Arc<dyn MemoryImporter>>,
    file_importer: Option<Arc<dyn FileImporter>>,
}

impl ZipExtensionImporter {
    /// Open an importer for `path`, which may name the archive itself
    /// or a subdirectory inside it (`lib.zip/plugins`); with the
    /// process-wide default configuration.
    pub fn new(path: &Path) -> Result<Self, ZipImportError> {
        Self::with_config(path, default_config())
    }

    pub fn with_config(path: &Path, config: Arc<ImportConfig>) -> Result<Self, ZipImportError> {
        let (root, prefix) = split_archive_path(path)?;
        let archive = ArchiveHandle::open(&root)?;
        Ok(Self {
            archive,
            prefix,
            config,
            memory_importer: None,
            file_importer: None,
        })
    }

    pub fn archive(&self) -> &ArchiveHandle {
        &self.archive
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn config(&self) -> &Arc<ImportConfig> {
        &self.config
    }

    /// Use a specific in-memory loader instead of the process-wide one.
    pub fn set_memory_importer(&mut self, importer: Arc<dyn MemoryImporter>) {
        self.memory_importer = Some(importer);
    }

    /// Use a specific file-based loader instead of the process-wide one.
    pub fn set_file_importer(&mut self, importer: Arc<dyn FileImporter>) {
        self.file_importer = Some(importer);
    }

    /// `<archive>/<prefix>` identifier used in origins and diagnostics.
    pub fn location(&self) -> String {
        if self.prefix.is_empty() {
            self.archive.label().to_string()
        } else {
            format!("{}/{}", self.archive.label(), self.prefix.trim_end_matches('/'))
        }
    }

    fn entry_prefix(&self, fullname: &str) -> String {
        match fullname.rfind('.') {
            Some(idx) => format!("{}{}/", self.prefix, fullname[..idx].replace('.', "/")),
            None => self.prefix.clone(),
        }
    }

    fn origin_of(&self, entry: &str) -> String {
        format!("{}/{}", self.archive.label(), entry.trim_end_matches('/'))
    }

    /// Resolve `fullname` to its backing entry without loading it.
    pub fn find_extension(&self, fullname: &str) -> Result<ModuleCandidate, ZipImportError> {
        resolve(
            &self.archive,
            &self.config,
            &self.entry_prefix(fullname),
            fullname,
        )
    }

    fn spec_for(&self, fullname: &str, candidate: &ModuleCandidate) -> ModuleSpec {
        let origin = self.origin_of(&candidate.path);
        let mut spec = if candidate.is_package {
            ModuleSpec::package(fullname, Some(&origin))
        } else {
            ModuleSpec::new(fullname, Some(&origin))
        };
        if candidate.is_package {
            let dir = match candidate.kind {
                CandidateKind::PackageDirectory => candidate.path.trim_end_matches('/'),
                _ => match candidate.path.rfind('/') {
                    Some(idx) => &candidate.path[..idx],
                    None => "",
                },
            };
            spec.submodule_search_locations =
                Some(vec![format!("{}/{dir}", self.archive.label())]);
        }
        if let CandidateKind::PackageDirectory = candidate.kind {
            // Namespace packages have a search location but no payload.
            spec.origin = None;
            spec.has_location = false;
        }
        spec
    }

    /// Load `fullname` from the archive and record it in the global
    /// registry. An already-registered module is returned as-is.
    pub fn load_module(&self, fullname: &str) -> Result<Arc<Module>, ZipImportError> {
        if let Some(module) = global_registry().lookup(fullname) {
            memimport::verbose!(2, "import {fullname} # previously loaded from zipfile {}", self.archive.label());
            return Ok(module);
        }

        let candidate = self.find_extension(fullname)?;
        let spec = self.spec_for(fullname, &candidate);
        let mut module = match candidate.kind {
            CandidateKind::PackageDirectory => Module::from_spec(&spec, BackingKind::Namespace),
            CandidateKind::Source => Module::from_spec(&spec, BackingKind::Source),
            CandidateKind::Extension { .. } => self.load_extension(fullname, &candidate, &spec)?,
        };

        module.set_parent_package(spec.parent().to_string());
        if let Some(locations) = &spec.submodule_search_locations {
            module.set_search_locations(locations.clone());
        }
        module.set_loader(Arc::new(self.clone()));

        let module = Arc::new(module);
        global_registry().register(module.clone());
        memimport::verbose!(
            1,
            "import {fullname} # loaded from zipfile {}",
            self.archive.label()
        );
        Ok(module)
    }

    fn load_extension(
        &self,
        fullname: &str,
        candidate: &ModuleCandidate,
        spec: &ModuleSpec,
    ) -> Result<Module, ZipImportError> {
        let leaf = fullname.rsplit('.').next().unwrap_or(fullname);
        let init_symbol = export_hook_name(fullname);

        if self.config.is_excluded(fullname, leaf) {
            // Never loaded from memory: extract to the disk cache and
            // hand the file to the conventional loader.
            let path = cache::materialize(&self.archive, &self.config, &candidate.path)?;
            let importer = self.required_file_importer(fullname)?;
            let module = importer.import_file(fullname, &path, &init_symbol)?;
            return Ok(module);
        }

        let importer = self.required_memory_importer(fullname)?;
        let origin = self.origin_of(&candidate.path);
        let get_data = |requested: &str| -> std::io::Result<Vec<u8>> {
            self.get_data(requested).map_err(|err| {
                std::io::Error::new(std::io::ErrorKind::NotFound, err.to_string())
            })
        };
        let mut module = importer.import_module(fullname, &origin, &init_symbol, &get_data, spec)?;
        module.set_origin(origin);
        Ok(module)
    }

    fn required_memory_importer(
        &self,
        fullname: &str,
    ) -> Result<Arc<dyn MemoryImporter>, ZipImportError> {
        self.memory_importer
            .clone()
            .or_else(memimport::memory_importer)
            .ok_or_else(|| {
                ZipImportError::Import(ImportError::Load {
                    module: fullname.to_string(),
                    reason: "no in-memory loader installed".to_string(),
                })
            })
    }

    fn required_file_importer(
        &self,
        fullname: &str,
    ) -> Result<Arc<dyn FileImporter>, ZipImportError> {
        self.file_importer
            .clone()
            .or_else(memimport::file_importer)
            .ok_or_else(|| {
                ZipImportError::Import(ImportError::Load {
                    module: fullname.to_string(),
                    reason: "no file-based loader installed".to_string(),
                })
            })
    }
}

/// The standard loader surface an archive-backed importer presents to
/// a host's import machinery: spec discovery plus the data-access and
/// introspection methods conventional loaders are expected to expose.
/// A wrapper over the archive handle rather than an extension of it;
/// hosts depending on the standard interface go through delegation.
pub trait ExtensionResolvingLoader: ModuleLoader {
    /// Describe how `fullname` would be loaded, or `NotFound`.
    fn find_spec(&self, fullname: &str) -> Result<ModuleSpec, ZipImportError>;

    fn is_package(&self, fullname: &str) -> Result<bool, ZipImportError>;

    /// Origin string for `fullname` (`__file__` analog). Namespace
    /// packages have none.
    fn get_filename(&self, fullname: &str) -> Result<Option<String>, ZipImportError>;

    /// Read the raw bytes of an archive entry. Accepts both bare entry
    /// paths and full origin strings produced by the importer.
    fn get_data(&self, path: &str) -> Result<Vec<u8>, ZipImportError>;
}

impl ExtensionResolvingLoader for ZipExtensionImporter {
    fn find_spec(&self, fullname: &str) -> Result<ModuleSpec, ZipImportError> {
        let candidate = self.find_extension(fullname)?;
        Ok(self.spec_for(fullname, &candidate))
    }

    fn is_package(&self, fullname: &str) -> Result<bool, ZipImportError> {
        Ok(self.find_extension(fullname)?.is_package)
    }

    fn get_filename(&self, fullname: &str) -> Result<Option<String>, ZipImportError> {
        let candidate = self.find_extension(fullname)?;
        Ok(match candidate.kind {
            CandidateKind::PackageDirectory => None,
            _ => Some(self.origin_of(&candidate.path)),
        })
    }

    fn get_data(&self, path: &str) -> Result<Vec<u8>, ZipImportError> {
        let normalized = normalize_entry_path(path);
        let label = normalize_entry_path(self.archive.label());
        let entry = normalized
            .strip_prefix(&format!("{label}/"))
            .unwrap_or(&normalized);
        self.archive.read(entry)
    }
}

impl ModuleLoader for ZipExtensionImporter {
    fn loader_repr(&self) -> String {
        format!("<ZipExtensionImporter \"{}\">", self.location())
    }

    fn load_module(&self, fullname: &str) -> Result<Arc<Module>, ImportError> {
        ZipExtensionImporter::load_module(self, fullname)
            .map_err(|err| err.into_import_error(fullname))
    }
}

/// Split a path that may reach inside an archive: walk up until an
/// existing file is found, and treat the remaining components as a
/// subdirectory prefix inside it.
fn split_archive_path(path: &Path) -> Result<(PathBuf, String), ZipImportError> {
    if path.is_file() {
        return Ok((path.to_path_buf(), String::new()));
    }
    let mut root = path.to_path_buf();
    let mut trailing: Vec<String> = Vec::new();
    while let Some(parent) = root.parent() {
        if let Some(name) = root.file_name() {
            trailing.push(name.to_string_lossy().into_owned());
        } else {
            break;
        }
        root = parent.to_path_buf();
        if root.is_file() {
            trailing.reverse();
            let mut prefix = trailing.join("/");
            prefix.push('/');
            return Ok((root, normalize_entry_path(&prefix)));
        }
    }
    Err(ZipImportError::NotArchive(path.to_path_buf()))
}
