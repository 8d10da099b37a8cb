use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use memimport::{
    BackingKind, GetData, ImportError, MemoryImporter, Module, ModuleSpec, UNKNOWN_ORIGIN,
    global_registry, memimport_with,
};
use parking_lot::Mutex;

/// Records what the loader boundary was asked to do and answers with a
/// plain extension-backed module.
#[derive(Default)]
struct RecordingImporter {
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String, String, usize)>>,
}

impl MemoryImporter for RecordingImporter {
    fn import_module(
        &self,
        fullname: &str,
        origin: &str,
        init_symbol: &str,
        get_data: &GetData<'_>,
        _spec: &ModuleSpec,
    ) -> Result<Module, ImportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = get_data(origin).map_err(|err| ImportError::Load {
            module: fullname.to_string(),
            reason: err.to_string(),
        })?;
        self.seen.lock().push((
            fullname.to_string(),
            origin.to_string(),
            init_symbol.to_string(),
            data.len(),
        ));
        Ok(Module::new(fullname, BackingKind::Extension))
    }
}

struct FailingImporter;

impl MemoryImporter for FailingImporter {
    fn import_module(
        &self,
        fullname: &str,
        _origin: &str,
        _init_symbol: &str,
        _get_data: &GetData<'_>,
        _spec: &ModuleSpec,
    ) -> Result<Module, ImportError> {
        Err(ImportError::Load {
            module: fullname.to_string(),
            reason: "missing entry point".to_string(),
        })
    }
}

#[test]
fn memimport_binds_and_registers_module() {
    let importer = RecordingImporter::default();
    let module = memimport_with(
        &importer,
        ModuleSpec::new("pkg.mem_mod", None),
        Some(vec![0u8; 16]),
    )
    .expect("import");

    assert_eq!(module.name(), "pkg.mem_mod");
    assert_eq!(module.origin(), Some(UNKNOWN_ORIGIN));
    assert_eq!(module.parent_package(), "pkg");
    assert_eq!(module.kind(), BackingKind::Extension);
    assert!(!module.is_package());

    let registered = global_registry().lookup("pkg.mem_mod").expect("registered");
    assert!(Arc::ptr_eq(&registered, &module));

    let seen = importer.seen.lock();
    let (name, origin, init, len) = &seen[0];
    assert_eq!(name, "pkg.mem_mod");
    // With no location the byte provider answers for the bare name.
    assert_eq!(origin, "pkg.mem_mod");
    assert_eq!(init, "PyInit_mem_mod");
    assert_eq!(*len, 16);
    global_registry().remove("pkg.mem_mod");
}

#[test]
fn memimport_seeds_package_search_locations() {
    let importer = RecordingImporter::default();
    let module = memimport_with(
        &importer,
        ModuleSpec::package("mempkg", Some("lib.zip/mempkg/__init__.so")),
        Some(vec![1, 2, 3]),
    )
    .expect("import");

    assert!(module.is_package());
    assert_eq!(
        module.search_locations(),
        Some(&["lib.zip/mempkg".to_string()][..])
    );
    assert_eq!(module.parent_package(), "mempkg");
    global_registry().remove("mempkg");
}

#[test]
fn load_failure_registers_nothing() {
    let err = memimport_with(
        &FailingImporter,
        ModuleSpec::new("mem_broken", None),
        Some(vec![0u8; 4]),
    )
    .expect_err("load must fail");
    assert!(matches!(err, ImportError::Load { .. }));
    assert!(global_registry().lookup("mem_broken").is_none());
}

#[test]
fn empty_module_name_is_a_configuration_error() {
    let err = memimport_with(
        &RecordingImporter::default(),
        ModuleSpec::new("", None),
        Some(Vec::new()),
    )
    .expect_err("empty name");
    assert!(matches!(err, ImportError::Configuration(_)));
}

#[test]
fn reload_of_memory_extension_is_unsupported() {
    let importer = RecordingImporter::default();
    memimport_with(
        &importer,
        ModuleSpec::new("mem_reload", None),
        Some(vec![0u8; 8]),
    )
    .expect("import");
    match global_registry().reload("mem_reload") {
        Err(ImportError::ReloadUnsupported(name)) => assert_eq!(name, "mem_reload"),
        other => panic!("expected ReloadUnsupported, got {other:?}"),
    }
    global_registry().remove("mem_reload");
}
