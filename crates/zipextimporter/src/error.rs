use std::fmt;
use std::io;
use std::path::PathBuf;

use memimport::ImportError;

/// Errors surfaced by archive-backed resolution and loading.
#[derive(Debug)]
pub enum ZipImportError {
    /// The given path does not denote a readable zip archive.
    NotArchive(PathBuf),
    /// The archive container rejected an operation (corrupt directory,
    /// unreadable entry, ...).
    Archive { archive: PathBuf, reason: String },
    /// No candidate entry matched the requested dotted name.
    NotFound(String),
    Io(io::Error),
    /// Failure propagated from the loader boundary.
    Import(ImportError),
}

impl fmt::Display for ZipImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZipImportError::NotArchive(path) => {
                write!(f, "not a zip archive: {}", path.display())
            }
            ZipImportError::Archive { archive, reason } => {
                write!(f, "archive error in {}: {reason}", archive.display())
            }
            ZipImportError::NotFound(name) => write!(f, "no module named '{name}'"),
            ZipImportError::Io(err) => write!(f, "i/o error: {err}"),
            ZipImportError::Import(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ZipImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ZipImportError::Io(err) => Some(err),
            ZipImportError::Import(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ZipImportError {
    fn from(err: io::Error) -> Self {
        ZipImportError::Io(err)
    }
}

impl From<ImportError> for ZipImportError {
    fn from(err: ImportError) -> Self {
        ZipImportError::Import(err)
    }
}

impl ZipImportError {
    /// Convert into a loader-boundary error, attributing archive
    /// failures to the module being loaded.
    pub fn into_import_error(self, module: &str) -> ImportError {
        match self {
            ZipImportError::NotFound(name) => ImportError::NotFound(name),
            ZipImportError::Io(err) => ImportError::Io(err),
            ZipImportError::Import(err) => err,
            other => ImportError::Load {
                module: module.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
