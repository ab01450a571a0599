//! Slipway - build preparation for Arduino-on-ESP32 projects
//!
//! This crate provides the core library functionality for Slipway,
//! including custom sdkconfig fingerprinting, framework package
//! installation, and the Python dependency bootstrap.

pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test fixtures for Slipway unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides in-memory framework archives for store
/// and unpacking tests.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    board::BoardConfig, package::PackageSpec, project::ProjectConfig, sdkconfig::CustomSdkconfig,
};

pub use crate::ops::{PrepareOptions, PrepareReport, PrepareStep, Verdict};
pub use crate::sources::FrameworkStore;
pub use crate::util::context::GlobalContext;
