//! Artifact cache management.
//!
//! The bootstrap never deletes anything from `<data folder>/libraries`.
//! These helpers are the way to inspect it and to clear out files that a
//! failed placeholder-mode download left behind.
//!
//! Backs the `kload cache` commands; the CLI does the printing.

use crate::catalog::LIBRARIES;
use crate::config::{ConfigStore, Settings};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CachedArtifact {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl CachedArtifact {
    /// Zero bytes: almost certainly a failed download.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// First 12 hex chars of the SHA-256. For eyeballing only.
    pub fn digest(&self) -> Result<String> {
        let mut file = fs::File::open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;

        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let n = file.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }

        let hash = format!("{:x}", hasher.finalize());
        Ok(hash[..12].to_string())
    }
}

/// Cached artifact files, sorted by name. In-flight temp files are skipped.
pub fn scan(folder: &Path) -> Result<Vec<CachedArtifact>> {
    if !folder.exists() {
        return Ok(Vec::new());
    }

    let mut artifacts = Vec::new();
    let entries = fs::read_dir(folder)
        .with_context(|| format!("Failed to read {}", folder.display()))?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        if let Ok(meta) = entry.metadata()
            && meta.is_file()
        {
            artifacts.push(CachedArtifact {
                name,
                path: entry.path(),
                size: meta.len(),
            });
        }
    }

    artifacts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(artifacts)
}

/// File names the current configuration resolves to.
pub fn expected_files(config: &dyn ConfigStore) -> Vec<String> {
    let settings = Settings::from_config(config);
    LIBRARIES
        .iter()
        .map(|lib| lib.to_dependency(config).file_name(&settings.packaging))
        .collect()
}

/// Remove every cached artifact, leaving an empty folder. Returns `false`
/// when there was no folder to clean.
pub fn clean(folder: &Path) -> Result<bool> {
    if !folder.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(folder).with_context(|| format!("Failed to remove {}", folder.display()))?;
    fs::create_dir_all(folder)?;
    debug!("Cleaned {}", folder.display());
    Ok(true)
}

/// Remove every cached file not named in `keep`. Returns the names removed.
///
/// A file that cannot be removed is logged and skipped.
pub fn prune_unused(folder: &Path, keep: &[String]) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for artifact in scan(folder)? {
        if keep.contains(&artifact.name) {
            continue;
        }
        match fs::remove_file(&artifact.path) {
            Ok(()) => removed.push(artifact.name),
            Err(e) => warn!("Failed to remove {}: {}", artifact.path.display(), e),
        }
    }
    Ok(removed)
}
