//! Boundary traits for the native loaders this crate integrates with.
//!
//! `MemoryImporter` is the contract of the external in-memory loader:
//! a native, platform-specific component that maps a raw extension
//! image into process memory, fixes it up, and runs its initialization
//! entry point. `FileImporter` is the conventional load-by-path
//! fallback used for materialized (disk-cached) entries.

use std::io;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::error::ImportError;
use crate::module::Module;
use crate::spec::ModuleSpec;

/// Byte-provider callback handed to the native loader. The loader may
/// invoke it zero or more times to retrieve the content for a declared
/// origin; captured bytes stay valid for the duration of the call.
pub type GetData<'a> = dyn Fn(&str) -> io::Result<Vec<u8>> + 'a;

/// The in-memory loader boundary. Implementations receive the module
/// name, the declared origin string, the initialization entry-point
/// symbol, a byte provider, and the module spec, and return a fully
/// initialized module or a single `Load` failure, never a partial
/// module.
pub trait MemoryImporter: Send + Sync {
    fn import_module(
        &self,
        fullname: &str,
        origin: &str,
        init_symbol: &str,
        get_data: &GetData<'_>,
        spec: &ModuleSpec,
    ) -> Result<Module, ImportError>;
}

/// Conventional file-based extension loader: standard load-by-path
/// contract, used for entries materialized to the disk cache.
pub trait FileImporter: Send + Sync {
    fn import_file(
        &self,
        fullname: &str,
        path: &Path,
        init_symbol: &str,
    ) -> Result<Module, ImportError>;
}

/// `FileImporter` backed by the platform dynamic loader. The opened
/// library is kept alive inside the module handle; the init symbol is
/// resolved up front so a non-extension file fails the load instead of
/// producing a half-initialized module.
#[cfg(not(target_arch = "wasm32"))]
pub struct DlopenFileImporter;

#[cfg(not(target_arch = "wasm32"))]
impl FileImporter for DlopenFileImporter {
    fn import_file(
        &self,
        fullname: &str,
        path: &Path,
        init_symbol: &str,
    ) -> Result<Module, ImportError> {
        let load_err = |reason: String| ImportError::Load {
            module: fullname.to_string(),
            reason,
        };
        let library = unsafe { libloading::Library::new(path) }
            .map_err(|err| load_err(err.to_string()))?;
        unsafe {
            library
                .get::<unsafe extern "C" fn()>(init_symbol.as_bytes())
                .map_err(|err| load_err(format!("missing entry point {init_symbol}: {err}")))?;
        }
        let mut module = Module::new(fullname, crate::module::BackingKind::Extension);
        module.set_origin(path.display().to_string());
        Ok(module.with_handle(Box::new(library)))
    }
}

static MEMORY_IMPORTER: Lazy<RwLock<Option<Arc<dyn MemoryImporter>>>> =
    Lazy::new(|| RwLock::new(None));

static FILE_IMPORTER: Lazy<RwLock<Option<Arc<dyn FileImporter>>>> = Lazy::new(|| {
    #[cfg(not(target_arch = "wasm32"))]
    {
        RwLock::new(Some(Arc::new(DlopenFileImporter)))
    }
    #[cfg(target_arch = "wasm32")]
    {
        RwLock::new(None)
    }
});

/// Install the process-wide in-memory loader. There is no built-in
/// default: the component is external and platform specific.
pub fn set_memory_importer(importer: Arc<dyn MemoryImporter>) {
    *MEMORY_IMPORTER.write() = Some(importer);
}

pub fn memory_importer() -> Option<Arc<dyn MemoryImporter>> {
    MEMORY_IMPORTER.read().clone()
}

/// Replace the process-wide file-based loader (defaults to the
/// platform dynamic loader on native targets).
pub fn set_file_importer(importer: Arc<dyn FileImporter>) {
    *FILE_IMPORTER.write() = Some(importer);
}

pub fn file_importer() -> Option<Arc<dyn FileImporter>> {
    FILE_IMPORTER.read().clone()
}
