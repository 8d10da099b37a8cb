//! zipextimporter: import native extension modules (and their
//! packages) directly out of zip archives.
//!
//! A [`ZipExtensionImporter`] is rooted at one archive, or at a
//! subdirectory inside it, and resolves dotted module names against the
//! archive's directory listing in platform discovery order: package
//! init entries before flat entries, binary suffixes before source
//! suffixes. Binary candidates found under non-canonical suffixes are
//! validated by searching the image for the expected initialization
//! entry point, so same-named data files cannot shadow a real
//! extension.
//!
//! Loading an extension entry goes through the in-memory loader
//! boundary of the `memimport` crate; modules registered as excluded
//! are instead extracted to a disk cache and loaded conventionally.
//!
//! ```rust,no_run
//! use std::path::Path;
//! use zipextimporter::ZipExtensionImporter;
//!
//! let importer = ZipExtensionImporter::new(Path::new("lib.zip"))?;
//! let module = importer.load_module("pkg.fast_codec")?;
//! assert_eq!(module.name(), "pkg.fast_codec");
//! # Ok::<(), zipextimporter::ZipImportError>(())
//! ```

mod archive;
mod cache;
mod config;
mod error;
mod importer;
mod resolver;
mod suffixes;
mod validate;

pub use archive::{ArchiveHandle, invalidate_caches};
pub use cache::{cache_root, materialize};
pub use config::{
    DEFAULT_VERSION_TAG, ImportConfig, default_config, excluded_modules, set_excluded_modules,
    set_version_bound_modules, version_bound_modules,
};
pub use error::ZipImportError;
pub use importer::{ExtensionResolvingLoader, ZipExtensionImporter};
pub use resolver::{CandidateKind, ModuleCandidate};
pub use suffixes::{SearchEntry, SuffixKind, SuffixTable};
pub use validate::is_genuine_extension;

pub use memimport::{set_verbose, verbosity};
