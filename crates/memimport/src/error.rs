use std::fmt;
use std::io;

/// Errors surfaced by the loader boundary and the module registry.
#[derive(Debug)]
pub enum ImportError {
    /// No module with the requested dotted name could be located.
    NotFound(String),
    /// The native loader rejected the image: missing entry point,
    /// malformed image, or platform refusal. Never produces a partial
    /// module.
    Load { module: String, reason: String },
    /// Reload was requested against an extension-backed module. Native
    /// in-memory images cannot be re-initialized in place; this must
    /// fail loudly rather than silently no-op.
    ReloadUnsupported(String),
    /// Invalid argument to an administrative entry point. No state is
    /// mutated when this is raised.
    Configuration(String),
    Io(io::Error),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::NotFound(name) => write!(f, "no module named '{name}'"),
            ImportError::Load { module, reason } => {
                write!(f, "could not load extension module '{module}': {reason}")
            }
            ImportError::ReloadUnsupported(name) => {
                write!(f, "cannot reload extension module '{name}' loaded from memory")
            }
            ImportError::Configuration(msg) => write!(f, "invalid configuration: {msg}"),
            ImportError::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ImportError {
    fn from(err: io::Error) -> Self {
        ImportError::Io(err)
    }
}
