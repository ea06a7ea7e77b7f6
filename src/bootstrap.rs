//! Startup sequence: resolve, fetch and link every catalog library.
//!
//! Each library is handled on its own. A failure is recorded in the report
//! and logged, and the next library is processed anyway, so a missing
//! optional library never stops the host from starting.

use crate::catalog::{LIBRARIES, LibraryDescriptor};
use crate::config::{ConfigStore, Settings};
use crate::dependency::Dependency;
use crate::error::{FetchError, LinkError};
use crate::fetch::{HttpTransport, Repository, Transport, ensure_folder};
use crate::link::{self, LinkTarget, Linked};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Directory under the host's data folder holding cached artifacts.
pub const LIBRARIES_DIR: &str = "libraries";

/// What the bootstrap needs from the application that owns the process.
pub trait Host {
    fn config(&self) -> &dyn ConfigStore;
    fn data_folder(&self) -> &Path;
    fn link_target(&self) -> &dyn LinkTarget;
}

#[derive(Debug)]
pub enum EntryOutcome {
    Linked(PathBuf),
    /// Fetched (or cached) and already part of the context
    AlreadyLinked(PathBuf),
    FetchFailed(FetchError),
    LinkFailed { path: PathBuf, error: LinkError },
}

impl EntryOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Linked(_) | Self::AlreadyLinked(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Linked(_) => "linked",
            Self::AlreadyLinked(_) => "already-linked",
            Self::FetchFailed(_) => "fetch-failed",
            Self::LinkFailed { .. } => "link-failed",
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Linked(path) | Self::AlreadyLinked(path) => Some(path),
            Self::LinkFailed { path, .. } => Some(path),
            Self::FetchFailed(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::FetchFailed(e) => Some(e.to_string()),
            Self::LinkFailed { error, .. } => Some(error.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct EntryReport {
    pub library: &'static str,
    pub dependency: Dependency,
    pub outcome: EntryOutcome,
}

/// Per-library results, in catalog order.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub cache_folder: PathBuf,
    pub entries: Vec<EntryReport>,
}

/// Flat, serializable view of one entry for `--json` output.
#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub library: String,
    pub dependency: String,
    pub status: String,
    pub path: Option<String>,
    pub error: Option<String>,
}

impl BootstrapReport {
    pub fn linked(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.outcome.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| !e.outcome.is_ok())
    }

    /// True when every library ended up in the loading context.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.entries
            .iter()
            .map(|entry| ReportRow {
                library: entry.library.to_string(),
                dependency: entry.dependency.to_string(),
                status: entry.outcome.label().to_string(),
                path: entry.outcome.path().map(|p| p.display().to_string()),
                error: entry.outcome.error_message(),
            })
            .collect()
    }
}

/// Runs the startup sequence against a [`Host`].
pub struct Bootstrap<T: Transport = HttpTransport> {
    transport: T,
    progress: bool,
}

impl Bootstrap<HttpTransport> {
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }
}

impl Default for Bootstrap<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> Bootstrap<T> {
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            progress: false,
        }
    }

    /// Show download progress bars.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Process every catalog library. Never fails as a whole; inspect the
    /// report for per-library results.
    pub fn run(&self, host: &dyn Host) -> BootstrapReport {
        let config = host.config();
        let settings = Settings::from_config(config);

        let folder = host.data_folder().join(LIBRARIES_DIR);
        if let Err(e) = ensure_folder(&folder) {
            // Every fetch below will fail and be reported individually.
            warn!("{}", e);
        }

        let repository = Repository::new(&settings, &self.transport).with_progress(self.progress);
        let target = host.link_target();

        let entries = LIBRARIES
            .iter()
            .map(|library| process(library, config, &repository, &folder, target))
            .collect();

        let report = BootstrapReport {
            cache_folder: folder,
            entries,
        };
        info!(
            "Bootstrap finished: {} linked, {} failed",
            report.linked().count(),
            report.failures().count()
        );
        report
    }
}

fn process(
    library: &'static LibraryDescriptor,
    config: &dyn ConfigStore,
    repository: &Repository<'_>,
    folder: &Path,
    target: &dyn LinkTarget,
) -> EntryReport {
    let dependency = library.to_dependency(config);

    let outcome = match repository.fetch_or_get(folder, &dependency) {
        Err(e) => EntryOutcome::FetchFailed(e),
        Ok(path) => match link::inject(target, &path) {
            Ok(Linked::Added) => EntryOutcome::Linked(path),
            Ok(Linked::AlreadyPresent) => EntryOutcome::AlreadyLinked(path),
            Err(e) => {
                error!("Failed to link {}: {}", dependency, e);
                EntryOutcome::LinkFailed { path, error: e }
            }
        },
    };

    EntryReport {
        library: library.name,
        dependency,
        outcome,
    }
}
