use super::{LinkTarget, Linked};
use crate::error::LinkError;
use libloading::Library;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Shared libraries opened into the process, searched in load order.
///
/// Libraries stay loaded until this value is dropped.
#[derive(Default)]
pub struct NativeLibraries {
    loaded: Mutex<Vec<(PathBuf, Library)>>,
    sealed: AtomicBool,
}

impl NativeLibraries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seal(&self) {
        self.sealed.store(true, Ordering::SeqCst);
    }

    pub fn sources(&self) -> Vec<PathBuf> {
        self.lock().iter().map(|(path, _)| path.clone()).collect()
    }

    /// First library exporting `symbol`, if any.
    pub fn find_symbol(&self, symbol: &str) -> Option<PathBuf> {
        self.lock()
            .iter()
            .find(|(_, lib)| {
                // SAFETY: the symbol is only looked up, never called or read.
                unsafe { lib.get::<*const ()>(symbol.as_bytes()).is_ok() }
            })
            .map(|(path, _)| path.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(PathBuf, Library)>> {
        self.loaded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LinkTarget for NativeLibraries {
    fn append_source(&self, path: &Path) -> Result<Linked, LinkError> {
        if self.sealed.load(Ordering::SeqCst) {
            return Err(LinkError::AccessDenied {
                path: path.to_path_buf(),
            });
        }

        let path = fs::canonicalize(path).map_err(|e| LinkError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut loaded = self.lock();
        if loaded.iter().any(|(p, _)| *p == path) {
            return Ok(Linked::AlreadyPresent);
        }

        // SAFETY: loading runs the library's initialisers. Artifacts come
        // from the configured repository, which the host trusts.
        let library = unsafe { Library::new(&path) }.map_err(|e| LinkError::Unsupported {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        loaded.push((path, library));
        Ok(Linked::Added)
    }
}
