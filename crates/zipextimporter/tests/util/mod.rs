//! Shared helpers for the integration tests: archive construction and
//! mock loader-boundary implementations.
#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use memimport::{BackingKind, FileImporter, GetData, ImportError, MemoryImporter, Module, ModuleSpec};
use zipextimporter::ImportConfig;

/// Write a zip archive with the given entries. Names ending in `/`
/// become explicit directory entries.
pub fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).expect("create archive");
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(name.trim_end_matches('/'), options)
                .expect("add directory");
        } else {
            zip.start_file(name.to_string(), options).expect("start file");
            zip.write_all(data).expect("write entry");
        }
    }
    zip.finish().expect("finish archive");
}

/// Fake binary extension image containing the given entry-point symbol
/// somewhere in its body.
pub fn extension_image(init_symbol: &str) -> Vec<u8> {
    let mut data = b"\x7fELFfake image ".to_vec();
    data.extend_from_slice(init_symbol.as_bytes());
    data.extend_from_slice(b"\0trailing");
    data
}

/// Platform-independent configuration: `.pyd` canonical, `.dll` shared
/// library, version tag `39`.
pub fn test_config() -> Arc<ImportConfig> {
    Arc::new(ImportConfig::with_suffixes(
        vec![".pyd".to_string()],
        ".dll",
        "39",
    ))
}

/// `MemoryImporter` that records each call and reads the bytes through
/// the provider, like the real loader would.
#[derive(Default)]
pub struct RecordingMemoryImporter {
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(String, String, String, usize)>>,
}

impl MemoryImporter for RecordingMemoryImporter {
    fn import_module(
        &self,
        fullname: &str,
        origin: &str,
        init_symbol: &str,
        get_data: &GetData<'_>,
        _spec: &ModuleSpec,
    ) -> Result<Module, ImportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = get_data(origin).map_err(ImportError::Io)?;
        self.seen.lock().push((
            fullname.to_string(),
            origin.to_string(),
            init_symbol.to_string(),
            data.len(),
        ));
        Ok(Module::new(fullname, BackingKind::Extension))
    }
}

/// `MemoryImporter` that always fails.
pub struct FailingMemoryImporter;

impl MemoryImporter for FailingMemoryImporter {
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
            reason: "mock failure".to_string(),
        })
    }
}

/// `FileImporter` that records the paths it was handed instead of
/// calling the platform loader.
#[derive(Default)]
pub struct RecordingFileImporter {
    pub calls: AtomicUsize,
    pub paths: Mutex<Vec<PathBuf>>,
}

impl FileImporter for RecordingFileImporter {
    fn import_file(
        &self,
        fullname: &str,
        path: &Path,
        _init_symbol: &str,
    ) -> Result<Module, ImportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().push(path.to_path_buf());
        let mut module = Module::new(fullname, BackingKind::Extension);
        module.set_origin(path.display().to_string());
        Ok(module)
    }
}
