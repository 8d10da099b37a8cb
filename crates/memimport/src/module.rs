use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::ImportError;
use crate::spec::ModuleSpec;

/// What kind of payload backs a loaded module. Decides reload behavior:
/// extension-backed modules cannot be reloaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackingKind {
    /// Native extension image initialized in memory or via dlopen.
    Extension,
    /// Source-form entry; reload re-runs the loader.
    Source,
    /// Implicit (namespace) package with only a search location.
    Namespace,
}

/// A loader capable of (re-)producing a module for a dotted name.
/// Stored on the module so the registry can drive reloads.
pub trait ModuleLoader: Send + Sync {
    /// Short description used in diagnostics.
    fn loader_repr(&self) -> String;

    fn load_module(&self, fullname: &str) -> Result<Arc<Module>, ImportError>;
}

/// A loaded module object: the descriptive fields the registry binder
/// populates, plus an opaque handle owned by whatever loader produced
/// the module (for dlopen-backed modules this keeps the library alive).
pub struct Module {
    name: String,
    origin: Option<String>,
    parent: String,
    search_locations: Option<Vec<String>>,
    kind: BackingKind,
    loader: Option<Arc<dyn ModuleLoader>>,
    handle: Option<Box<dyn Any + Send + Sync>>,
}

impl Module {
    pub fn new(name: &str, kind: BackingKind) -> Self {
        Self {
            name: name.to_string(),
            origin: None,
            parent: String::new(),
            search_locations: None,
            kind,
            loader: None,
            handle: None,
        }
    }

    pub fn from_spec(spec: &ModuleSpec, kind: BackingKind) -> Self {
        let mut module = Self::new(&spec.name, kind);
        module.origin = spec.origin.clone();
        module.parent = spec.parent().to_string();
        module.search_locations = spec.submodule_search_locations.clone();
        module
    }

    pub fn with_handle(mut self, handle: Box<dyn Any + Send + Sync>) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn set_origin(&mut self, origin: String) {
        self.origin = Some(origin);
    }

    /// Parent package name (`__package__` analog).
    pub fn parent_package(&self) -> &str {
        &self.parent
    }

    pub fn set_parent_package(&mut self, parent: String) {
        self.parent = parent;
    }

    /// Submodule search locations (`__path__` analog); present only for
    /// package modules.
    pub fn search_locations(&self) -> Option<&[String]> {
        self.search_locations.as_deref()
    }

    pub fn set_search_locations(&mut self, locations: Vec<String>) {
        self.search_locations = Some(locations);
    }

    pub fn is_package(&self) -> bool {
        self.search_locations.is_some()
    }

    pub fn kind(&self) -> BackingKind {
        self.kind
    }

    pub fn loader(&self) -> Option<Arc<dyn ModuleLoader>> {
        self.loader.clone()
    }

    pub fn set_loader(&mut self, loader: Arc<dyn ModuleLoader>) {
        self.loader = Some(loader);
    }

    pub fn handle(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.handle.as_deref()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("origin", &self.origin)
            .field("parent", &self.parent)
            .field("kind", &self.kind)
            .field("is_package", &self.is_package())
            .finish_non_exhaustive()
    }
}
