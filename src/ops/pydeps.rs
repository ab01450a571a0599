//! Python dependency bootstrap.
//!
//! The framework sub-builds lean on a small set of Python helper
//! packages. Before preparing anything, the installed versions are
//! queried through pip, diffed against the required minimums, and the
//! shortfall installed with exactly one batched pip invocation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::{Version, VersionReq};
use serde::Deserialize;

use crate::util::pepver::pepver_to_semver;
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Shell, Status};

/// A required Python helper package.
#[derive(Debug, Clone, Copy)]
pub struct PyDep {
    pub name: &'static str,
    pub req: &'static str,
}

impl PyDep {
    /// The pip install specifier, e.g. `wheel>=0.35.1`.
    pub fn spec(&self) -> String {
        format!("{}{}", self.name, self.req)
    }
}

/// Helper packages the framework sub-builds depend on.
pub const PYTHON_DEPS: &[PyDep] = &[
    PyDep {
        name: "wheel",
        req: ">=0.35.1",
    },
    PyDep {
        name: "PyYAML",
        req: ">=6.0.2",
    },
    PyDep {
        name: "intelhex",
        req: ">=2.3.0",
    },
];

#[derive(Debug, Deserialize)]
struct PipPackage {
    name: String,
    version: String,
}

/// Parse `pip list --format=json` output into name -> version.
///
/// Unparseable JSON degrades to an empty map with a warning; the
/// bootstrap then at worst re-installs packages that were already
/// present. Entries whose versions do not coerce to semver are skipped
/// and treated as not installed.
pub fn parse_installed(output: &[u8]) -> BTreeMap<String, Version> {
    let packages: Vec<PipPackage> = match serde_json::from_slice(output) {
        Ok(packages) => packages,
        Err(err) => {
            tracing::warn!("could not parse the list of installed Python packages: {err}");
            return BTreeMap::new();
        }
    };

    let mut installed = BTreeMap::new();
    for package in packages {
        match pepver_to_semver(&package.version) {
            Some(version) => {
                installed.insert(package.name, version);
            }
            None => {
                tracing::debug!(
                    "skipping {} with unparseable version {}",
                    package.name,
                    package.version
                );
            }
        }
    }
    installed
}

/// Required packages that are absent or under-versioned.
pub fn outdated(installed: &BTreeMap<String, Version>) -> Result<Vec<&'static PyDep>> {
    let mut missing = Vec::new();
    for dep in PYTHON_DEPS {
        let req = VersionReq::parse(dep.req)
            .with_context(|| format!("invalid requirement for {}", dep.name))?;
        match installed.get(dep.name) {
            Some(version) if req.matches(version) => {}
            _ => missing.push(dep),
        }
    }
    Ok(missing)
}

/// Thin wrapper over `python -m pip`.
#[derive(Debug, Clone)]
pub struct PipClient {
    python: PathBuf,
}

impl PipClient {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        PipClient {
            python: python.into(),
        }
    }

    /// Query installed packages.
    pub fn installed(&self) -> Result<BTreeMap<String, Version>> {
        let output = ProcessBuilder::new(&self.python)
            .args(["-m", "pip", "list", "--format=json", "--disable-pip-version-check"])
            .exec_and_check()?;
        Ok(parse_installed(&output.stdout))
    }

    /// Install the given specs with one batched invocation, streaming
    /// pip's output to the terminal.
    pub fn install(&self, specs: &[String]) -> Result<()> {
        ProcessBuilder::new(&self.python)
            .args(["-m", "pip", "install", "-U"])
            .args(specs)
            .status_and_check()
    }
}

/// Options for the dependency bootstrap.
#[derive(Debug, Clone, Default)]
pub struct PydepsOptions {
    /// Report what would be installed without invoking pip install.
    pub dry_run: bool,
}

/// Ensure the required Python helper packages are present.
///
/// Returns the specs that were installed (or would be, on a dry run);
/// empty when everything was already satisfied.
pub fn ensure_python_deps(python: &Path, shell: &Shell, opts: &PydepsOptions) -> Result<Vec<String>> {
    shell.status(
        Status::Checking,
        format!("python dependencies ({})", python.display()),
    );

    let client = PipClient::new(python);
    let installed = client.installed()?;
    let missing = outdated(&installed)?;

    if missing.is_empty() {
        tracing::debug!("python dependencies already satisfied");
        return Ok(Vec::new());
    }

    let specs: Vec<String> = missing.iter().map(|dep| dep.spec()).collect();
    shell.status(Status::Installing, specs.join(", "));

    if !opts.dry_run {
        client.install(&specs)?;
    }

    Ok(specs)
}
