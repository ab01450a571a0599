//! High-level operations backing the CLI commands.

pub mod freshness;
pub mod prepare;
pub mod pydeps;

pub use freshness::{needs_libs_build, FreshnessCheck, Verdict};
pub use prepare::{
    check, framework_build_gate, prepare, CheckReport, Hook, PrepareOptions, PrepareReport,
    PrepareStep,
};
pub use pydeps::{ensure_python_deps, PipClient, PydepsOptions, PYTHON_DEPS};
