//! Runtime linking into a live loading context.
//!
//! A loading context is owned by the host and already in use when the
//! bootstrap runs. The only thing the bootstrap may do with it is append a
//! source, which is what [`LinkTarget`] exposes.
//!
//! Two contexts are provided:
//!
//! - [`ClassPath`] - ordered zip/jar archives, searched first to last
//! - [`NativeLibraries`] - shared libraries opened with `libloading`

mod classpath;
mod native;

pub use classpath::ClassPath;
pub use native::NativeLibraries;

use crate::error::LinkError;
use std::path::Path;
use tracing::{debug, info};

/// What happened when a source was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linked {
    Added,
    /// The same file was linked earlier; the context is unchanged.
    AlreadyPresent,
}

/// The one capability the bootstrap needs from a loading context.
///
/// Implementations must be append-only and must treat a second append of
/// the same file as a no-op. They may refuse with
/// [`LinkError::AccessDenied`].
pub trait LinkTarget {
    fn append_source(&self, path: &Path) -> Result<Linked, LinkError>;
}

/// Append `file` to `target`.
pub fn inject(target: &dyn LinkTarget, file: &Path) -> Result<Linked, LinkError> {
    let linked = target.append_source(file)?;
    match linked {
        Linked::Added => info!("Linked {}", file.display()),
        Linked::AlreadyPresent => debug!("{} already linked", file.display()),
    }
    Ok(linked)
}
