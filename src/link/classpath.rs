use super::{LinkTarget, Linked};
use crate::error::LinkError;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

const MAX_PREALLOC: u64 = 1 << 20;

struct Archive {
    path: PathBuf,
    entries: HashSet<String>,
}

/// An ordered search path of zip archives (jar files).
///
/// Readers share the classpath by reference. Appending goes through
/// [`LinkTarget`] and stops working once the classpath is sealed.
#[derive(Default)]
pub struct ClassPath {
    archives: RwLock<Vec<Archive>>,
    sealed: AtomicBool,
}

impl ClassPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse any further sources.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::SeqCst)
    }

    /// Linked archives in search order.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.read().iter().map(|a| a.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First archive containing the entry `name`.
    pub fn find_resource(&self, name: &str) -> Option<PathBuf> {
        self.read()
            .iter()
            .find(|a| a.entries.contains(name))
            .map(|a| a.path.clone())
    }

    /// Bytes of the entry `name` from the first archive containing it.
    pub fn read_resource(&self, name: &str) -> Result<Option<Vec<u8>>, LinkError> {
        let Some(path) = self.find_resource(name) else {
            return Ok(None);
        };

        let mut archive = open_archive(&path)?;
        let mut entry = archive.by_name(name).map_err(|e| LinkError::Unsupported {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let mut bytes = Vec::with_capacity(capacity_hint(entry.size()));
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| LinkError::Io { path, source: e })?;
        Ok(Some(bytes))
    }

    /// Class file bytes for a binary name such as `kotlin.Unit`.
    pub fn load_class(&self, binary_name: &str) -> Result<Option<Vec<u8>>, LinkError> {
        self.read_resource(&Self::class_resource_name(binary_name))
    }

    /// `kotlin.collections.ArraysKt` -> `kotlin/collections/ArraysKt.class`
    pub fn class_resource_name(binary_name: &str) -> String {
        format!("{}.class", binary_name.replace('.', "/"))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Archive>> {
        self.archives.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Archive>> {
        self.archives.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl LinkTarget for ClassPath {
    fn append_source(&self, path: &Path) -> Result<Linked, LinkError> {
        if self.is_sealed() {
            return Err(LinkError::AccessDenied {
                path: path.to_path_buf(),
            });
        }

        let path = fs::canonicalize(path).map_err(|e| LinkError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut archives = self.write();
        if archives.iter().any(|a| a.path == path) {
            return Ok(Linked::AlreadyPresent);
        }

        let entries = open_archive(&path)?
            .file_names()
            .map(str::to_string)
            .collect();
        archives.push(Archive { path, entries });
        Ok(Linked::Added)
    }
}

/// The declared size comes from the archive and is not trusted.
fn capacity_hint(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

fn open_archive(path: &Path) -> Result<zip::ZipArchive<File>, LinkError> {
    let file = File::open(path).map_err(|e| LinkError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    zip::ZipArchive::new(file).map_err(|e| LinkError::Unsupported {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
