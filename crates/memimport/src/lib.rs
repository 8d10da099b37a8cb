//! memimport: load native extension modules from memory, without
//! writing them to the file system.
//!
//! The crate models the boundary around an external in-memory loader
//! (a native component that maps a raw extension image into process
//! memory and runs its initialization entry point) and everything a
//! host needs around that call: module specs and module objects, the
//! process-wide module registry with explicit reload semantics,
//! entry-point symbol name derivation, and verbosity-gated
//! diagnostics.
//!
//! Host programs install a [`MemoryImporter`] once and then import
//! modules from byte buffers:
//!
//! ```rust,no_run
//! use memimport::memimport_from_data;
//!
//! let data: Vec<u8> = Vec::new(); // read from disk or the network
//! let module = memimport_from_data("mem_mod", data)?;
//! assert_eq!(module.name(), "mem_mod");
//! # Ok::<(), memimport::ImportError>(())
//! ```
//!
//! Archive-backed resolution on top of this boundary lives in the
//! `zipextimporter` crate.

use std::io;
use std::sync::Arc;

#[macro_use]
mod verbose;

mod error;
mod hook;
mod importer;
mod module;
mod registry;
mod spec;

pub use error::ImportError;
pub use hook::export_hook_name;
pub use importer::{
    FileImporter, GetData, MemoryImporter, file_importer, memory_importer, set_file_importer,
    set_memory_importer,
};
#[cfg(not(target_arch = "wasm32"))]
pub use importer::DlopenFileImporter;
pub use module::{BackingKind, Module, ModuleLoader};
pub use registry::{ModuleRegistry, global as global_registry};
pub use spec::ModuleSpec;
pub use verbose::{set_verbose, verbosity};

/// Origin string used for modules supplied as raw byte buffers with no
/// backing location. Such modules cannot be reloaded.
pub const UNKNOWN_ORIGIN: &str = "<unknown>";

/// Import an extension module through an explicit in-memory loader.
///
/// Normalizes the spec (unknown origin, submodule-search seeding for
/// packages), derives the entry-point symbol, invokes the loader with a
/// byte provider, binds the descriptive fields on the returned module,
/// and records it in the global registry.
pub fn memimport_with(
    importer: &dyn MemoryImporter,
    spec: ModuleSpec,
    data: Option<Vec<u8>>,
) -> Result<Arc<Module>, ImportError> {
    let mut spec = spec;
    if spec.name.is_empty() {
        return Err(ImportError::Configuration(
            "module name must not be empty".to_string(),
        ));
    }
    if spec.origin.is_none() {
        spec.origin = Some(UNKNOWN_ORIGIN.to_string());
        spec.has_location = false;
    }
    let origin = spec
        .origin
        .clone()
        .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string());
    if spec.is_package {
        match &mut spec.submodule_search_locations {
            Some(locations) => {
                if locations.is_empty() && origin != UNKNOWN_ORIGIN {
                    if let Some(idx) = origin.rfind('/') {
                        locations.push(origin[..idx].to_string());
                    }
                }
            }
            None => spec.submodule_search_locations = Some(Vec::new()),
        }
    }

    // The byte provider answers for the declared origin (or the bare
    // module name when no location exists) from the supplied buffer,
    // and falls back to the file system otherwise.
    let path_key = if origin == UNKNOWN_ORIGIN {
        spec.name.clone()
    } else {
        origin.clone()
    };
    let name = spec.name.clone();
    let get_data = |requested: &str| -> io::Result<Vec<u8>> {
        if let Some(bytes) = data.as_ref() {
            if requested == path_key || requested == name {
                return Ok(bytes.clone());
            }
            return Err(io::Error::new(io::ErrorKind::NotFound, requested.to_string()));
        }
        std::fs::read(requested)
    };

    let init_symbol = export_hook_name(&spec.name);
    let mut module = importer.import_module(&spec.name, &path_key, &init_symbol, &get_data, &spec)?;

    module.set_origin(origin.clone());
    module.set_parent_package(spec.parent().to_string());
    if let Some(locations) = &spec.submodule_search_locations {
        module.set_search_locations(locations.clone());
    }
    let module = Arc::new(module);
    registry::global().register(module.clone());
    verbose!(1, "import {} # loaded from {}", spec.name, origin);
    Ok(module)
}

/// Import an extension module from a raw byte buffer through the
/// process-wide in-memory loader.
pub fn memimport_from_data(fullname: &str, data: Vec<u8>) -> Result<Arc<Module>, ImportError> {
    let importer = required_memory_importer()?;
    memimport_with(importer.as_ref(), ModuleSpec::new(fullname, None), Some(data))
}

/// Import an extension module described by `spec` through the
/// process-wide in-memory loader. When `data` is `None`, the byte
/// provider reads the spec's origin from the file system.
pub fn memimport_from_spec(
    spec: ModuleSpec,
    data: Option<Vec<u8>>,
) -> Result<Arc<Module>, ImportError> {
    let importer = required_memory_importer()?;
    memimport_with(importer.as_ref(), spec, data)
}

fn required_memory_importer() -> Result<Arc<dyn MemoryImporter>, ImportError> {
    importer::memory_importer().ok_or_else(|| {
        ImportError::Configuration("no in-memory loader installed".to_string())
    })
}
