//! # kload - Runtime Library Bootstrapper
//!
//! kload resolves a fixed set of Kotlin runtime libraries to pinned Maven
//! artifacts, downloads the ones that are not cached yet, and links them into
//! a loading context that is already in use by the host process.
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a default config.toml into the data folder
//! kload init
//!
//! # Fetch and link everything, then look a class up
//! kload run --resolve kotlin.Unit
//! ```
//!
//! ## Module Organization
//!
//! - [`catalog`] - The compiled-in library list
//! - [`dependency`] - Maven coordinates, cache file names and URLs
//! - [`fetch`] - Download and local cache
//! - [`link`] - Appending sources to a live loading context
//! - [`bootstrap`] - The startup sequence and its report
//! - [`host`] - A data-folder backed host used by the CLI

/// Startup sequence and per-library report.
pub mod bootstrap;

/// Cache inspection and cleanup.
pub mod cache;

/// Compiled-in library catalog.
pub mod catalog;

/// Host configuration (`config.toml`).
pub mod config;

/// Maven coordinates.
pub mod dependency;

/// Error types.
pub mod error;

/// Artifact download and cache.
pub mod fetch;

/// Standalone host.
pub mod host;

/// Loading contexts and the link step.
pub mod link;

/// Terminal UI utilities (tables).
pub mod ui;

pub use bootstrap::{Bootstrap, BootstrapReport, EntryOutcome, Host};
pub use catalog::{LIBRARIES, LibraryDescriptor};
pub use dependency::Dependency;
pub use link::{ClassPath, LinkTarget, Linked, NativeLibraries};
