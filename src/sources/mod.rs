//! Framework package storage.
//!
//! The store resolves an installed package name to its directory,
//! removes stale installs, and installs replacements from the archive
//! URI a package spec carries.

pub mod archive;
pub mod store;

pub use store::FrameworkStore;
