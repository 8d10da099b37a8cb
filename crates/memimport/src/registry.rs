//! Process-wide module registry with explicit reload semantics.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ImportError;
use crate::module::{BackingKind, Module};

pub struct ModuleRegistry {
    modules: RwLock<HashMap<String, Arc<Module>>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: RwLock::new(HashMap::new()),
        }
    }

    /// Record a module under its dotted name, replacing any stale prior
    /// entry. Returns the replaced module, if any.
    pub fn register(&self, module: Arc<Module>) -> Option<Arc<Module>> {
        self.modules
            .write()
            .insert(module.name().to_string(), module)
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Module>> {
        self.modules.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Module>> {
        self.modules.write().remove(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.modules.read().keys().cloned().collect()
    }

    /// Reload a registered module. Extension-backed modules always fail
    /// with `ReloadUnsupported`: a native image initialized in memory
    /// cannot be safely re-initialized in place, and pretending the
    /// reload happened would hand back stale state. Source and
    /// namespace modules re-run their loader and return to the loaded
    /// state.
    pub fn reload(&self, name: &str) -> Result<Arc<Module>, ImportError> {
        let module = self
            .lookup(name)
            .ok_or_else(|| ImportError::NotFound(name.to_string()))?;
        if module.kind() == BackingKind::Extension {
            return Err(ImportError::ReloadUnsupported(name.to_string()));
        }
        let loader = module.loader().ok_or_else(|| {
            ImportError::Configuration(format!("module '{name}' has no loader to reload through"))
        })?;
        // Drop the entry so the loader performs a real load instead of
        // returning the registered module.
        let prior = self.remove(name);
        match loader.load_module(name) {
            Ok(fresh) => {
                crate::verbose!(1, "reload {name} # via {}", loader.loader_repr());
                Ok(fresh)
            }
            Err(err) => {
                if let Some(prior) = prior {
                    self.register(prior);
                }
                Err(err)
            }
        }
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The global module registry.
pub fn global() -> &'static ModuleRegistry {
    static REGISTRY: once_cell::sync::Lazy<ModuleRegistry> =
        once_cell::sync::Lazy::new(ModuleRegistry::new);
    &REGISTRY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleLoader;

    struct FixedLoader;

    impl ModuleLoader for FixedLoader {
        fn loader_repr(&self) -> String {
            "<FixedLoader>".to_string()
        }

        fn load_module(&self, fullname: &str) -> Result<Arc<Module>, ImportError> {
            let module = Arc::new(Module::new(fullname, BackingKind::Source));
            global().register(module.clone());
            Ok(module)
        }
    }

    #[test]
    fn register_replaces_stale_entry() {
        let registry = ModuleRegistry::new();
        let first = Arc::new(Module::new("reg_replace", BackingKind::Source));
        assert!(registry.register(first.clone()).is_none());
        let second = Arc::new(Module::new("reg_replace", BackingKind::Source));
        let stale = registry.register(second.clone()).expect("stale entry");
        assert!(Arc::ptr_eq(&stale, &first));
        let current = registry.lookup("reg_replace").expect("current");
        assert!(Arc::ptr_eq(&current, &second));
    }

    #[test]
    fn reload_of_extension_module_is_unsupported() {
        let registry = ModuleRegistry::new();
        registry.register(Arc::new(Module::new("reg_ext", BackingKind::Extension)));
        match registry.reload("reg_ext") {
            Err(ImportError::ReloadUnsupported(name)) => assert_eq!(name, "reg_ext"),
            other => panic!("expected ReloadUnsupported, got {other:?}"),
        }
    }

    #[test]
    fn reload_of_source_module_reruns_loader() {
        let mut module = Module::new("reg_src_reload", BackingKind::Source);
        module.set_loader(Arc::new(FixedLoader));
        let original = Arc::new(module);
        global().register(original.clone());
        let fresh = global().reload("reg_src_reload").expect("reload");
        assert!(!Arc::ptr_eq(&fresh, &original));
        assert!(Arc::ptr_eq(
            &global().lookup("reg_src_reload").expect("registered"),
            &fresh
        ));
        global().remove("reg_src_reload");
    }

    #[test]
    fn reload_of_unknown_module_is_not_found() {
        let registry = ModuleRegistry::new();
        assert!(matches!(
            registry.reload("reg_missing"),
            Err(ImportError::NotFound(_))
        ));
    }
}
