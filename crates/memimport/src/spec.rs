/// Description of how a module is to be loaded: name, declared origin,
/// and package shape. Built by a resolver (or by hand for raw in-memory
/// data) and consumed by the loader boundary.
#[derive(Clone, Debug)]
pub struct ModuleSpec {
    pub name: String,
    /// Declared origin string; `None` means "unknown", used for modules
    /// supplied as raw byte buffers with no backing location.
    pub origin: Option<String>,
    pub is_package: bool,
    /// Search locations for submodules. `Some(vec![])` requests seeding
    /// from the origin's directory during import.
    pub submodule_search_locations: Option<Vec<String>>,
    /// Whether `origin` denotes a real location (used for reload).
    pub has_location: bool,
}

impl ModuleSpec {
    pub fn new(name: &str, origin: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            origin: origin.map(str::to_string),
            is_package: false,
            submodule_search_locations: None,
            has_location: origin.is_some(),
        }
    }

    pub fn package(name: &str, origin: Option<&str>) -> Self {
        let mut spec = Self::new(name, origin);
        spec.is_package = true;
        spec.submodule_search_locations = Some(Vec::new());
        spec
    }

    /// Parent package name: the name itself for packages, the name with
    /// the last dotted component removed otherwise.
    pub fn parent(&self) -> &str {
        if self.is_package {
            &self.name
        } else {
            match self.name.rfind('.') {
                Some(idx) => &self.name[..idx],
                None => "",
            }
        }
    }
}
