//! The fixed set of libraries the loader provides.
//!
//! Entries are compiled in. Their order is the fetch and link order.

use crate::config::{ConfigStore, NAMESPACE};
use crate::dependency::{Dependency, resolve};
use tracing::warn;

/// A logical library and where it lives in a Maven repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryDescriptor {
    /// Short name used in configuration keys (e.g. `stdlib`)
    pub name: &'static str,
    pub group_id: &'static str,
    pub artifact_id: &'static str,
}

pub const LIBRARIES: &[LibraryDescriptor] = &[
    LibraryDescriptor {
        name: "coroutines",
        group_id: "org.jetbrains.kotlinx",
        artifact_id: "kotlinx-coroutines-jdk8",
    },
    LibraryDescriptor {
        name: "stdlib",
        group_id: "org.jetbrains.kotlin",
        artifact_id: "kotlin-stdlib-jdk8",
    },
    LibraryDescriptor {
        name: "reflect",
        group_id: "org.jetbrains.kotlin",
        artifact_id: "kotlin-reflect",
    },
];

impl LibraryDescriptor {
    /// Look up a catalog entry by its logical name.
    pub fn find(name: &str) -> Option<&'static LibraryDescriptor> {
        LIBRARIES.iter().find(|lib| lib.name == name)
    }

    /// Configuration key holding this library's version.
    pub fn version_key(&self) -> String {
        format!("{}.library.{}", NAMESPACE, self.name)
    }

    /// Resolve against the configured version.
    ///
    /// A missing version is not an error here: it resolves to an empty
    /// version and fails later at download time.
    pub fn to_dependency(&self, config: &dyn ConfigStore) -> Dependency {
        let key = self.version_key();
        let version = config.get_string(&key).unwrap_or_else(|| {
            warn!("No version configured for {} ({})", self.name, key);
            String::new()
        });
        resolve(self, version)
    }
}
