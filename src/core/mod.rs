//! Core data structures for Slipway.
//!
//! This module contains the foundational types used throughout Slipway:
//! - Project file schema and environment selection
//! - Board manifests
//! - Framework package specs
//! - Custom sdkconfig text, fingerprints, and the marker artifact

pub mod board;
pub mod package;
pub mod project;
pub mod sdkconfig;

pub use board::BoardConfig;
pub use package::PackageSpec;
pub use project::{EnvConfig, ProjectConfig};
pub use sdkconfig::CustomSdkconfig;
