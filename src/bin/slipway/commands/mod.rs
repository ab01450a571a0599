//! Command implementations

pub mod check;
pub mod clean;
pub mod completions;
pub mod deps;
pub mod fingerprint;
pub mod prepare;
