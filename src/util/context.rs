//! Global context for Slipway operations.
//!
//! Provides centralized access to paths and environment: the current
//! working directory, the per-user data directory, and the root under
//! which framework packages are installed.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};

use crate::core::project::{ProjectError, PROJECT_FILE};

/// Project directories for Slipway
static PROJECT_DIRS: LazyLock<Option<ProjectDirs>> =
    LazyLock::new(|| ProjectDirs::from("com", "slipway", "slipway"));

/// Global context containing paths and environment.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global Slipway data (~/.slipway/)
    home: PathBuf,

    /// Override for the package installation root (--packages-root)
    packages_root: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext with defaults.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;

        let home = if let Some(dirs) = PROJECT_DIRS.as_ref() {
            dirs.cache_dir().to_path_buf()
        } else {
            // Fallback to ~/.slipway
            BaseDirs::new()
                .map(|b| b.home_dir().join(".slipway"))
                .unwrap_or_else(|| PathBuf::from(".slipway"))
        };

        Ok(GlobalContext {
            cwd,
            home,
            packages_root: None,
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Override the package installation root.
    pub fn set_packages_root(&mut self, root: Option<PathBuf>) {
        self.packages_root = root;
    }

    /// The explicit package-root override, if one was given.
    pub fn packages_root_override(&self) -> Option<&Path> {
        self.packages_root.as_deref()
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the Slipway home directory (~/.slipway/).
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Get the root directory under which framework packages are installed.
    ///
    /// The --packages-root flag (or SLIPWAY_PACKAGES_ROOT) takes precedence
    /// over the per-user default.
    pub fn packages_dir(&self) -> PathBuf {
        match &self.packages_root {
            Some(root) => root.clone(),
            None => self.home.join("packages"),
        }
    }

    /// Find the project file (slipway.toml) starting from cwd and
    /// searching upward.
    pub fn find_project_file(&self) -> Result<PathBuf, ProjectError> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(PROJECT_FILE);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(ProjectError::NotFound {
                    dir: self.cwd.clone(),
                });
            }
        }
    }

    /// Find the project root (directory containing slipway.toml).
    pub fn find_project_root(&self) -> Result<PathBuf, ProjectError> {
        self.find_project_file().map(|p| {
            p.parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.cwd.clone())
        })
    }
}
