//! The framework package store.
//!
//! Installed packages live in directories named after the package under
//! a single root. Installing fetches the spec's archive URI (HTTP or a
//! local `file://` archive) and unpacks it into the package directory.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

use crate::core::package::PackageSpec;
use crate::sources::archive::unpack_tar_gz;
use crate::util::fs;
use crate::util::shell::{Shell, Status};

/// Resolves, removes, and installs framework packages under one root.
#[derive(Debug, Clone)]
pub struct FrameworkStore {
    root: PathBuf,
}

impl FrameworkStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FrameworkStore { root: root.into() }
    }

    /// The store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a package of the given name installs into.
    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Whether a package of the given name is installed. An empty
    /// directory does not count: an interrupted install can leave one
    /// behind, and it holds no framework.
    pub fn is_installed(&self, name: &str) -> bool {
        match std::fs::read_dir(self.package_dir(name)) {
            Ok(mut entries) => entries.next().is_some(),
            Err(_) => false,
        }
    }

    /// Remove an installed package. Removing an absent package is not
    /// an error.
    pub fn remove(&self, name: &str, shell: &Shell) -> Result<()> {
        let dir = self.package_dir(name);
        if dir.exists() {
            fs::remove_dir_all_if_exists(&dir)?;
            shell.status(Status::Removed, format!("{} ({})", name, dir.display()));
            tracing::debug!("removed package directory {}", dir.display());
        }
        Ok(())
    }

    /// Install a package from its spec's archive URI, returning the
    /// package directory.
    pub fn install(&self, spec: &PackageSpec, shell: &Arc<Shell>) -> Result<PathBuf> {
        let url = spec.download_url()?;
        let dest = self.package_dir(&spec.name);

        shell.status(Status::Fetching, url.as_str());
        tracing::info!("fetching {} from {}", spec.name, url);

        // The unpacker creates `dest` only once the archive is in hand,
        // so a failed fetch leaves no package directory behind.
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| anyhow!("invalid file url: {}", url))?;
                let file = File::open(&path)
                    .with_context(|| format!("failed to open archive {}", path.display()))?;
                shell.status(Status::Unpacking, &spec.name);
                unpack_tar_gz(file, &dest)
                    .with_context(|| format!("failed to unpack archive from {}", url))?;
            }
            _ => {
                let staged = download(url, shell)?;
                let file = staged
                    .reopen()
                    .context("failed to reopen staged archive")?;
                shell.status(Status::Unpacking, &spec.name);
                unpack_tar_gz(file, &dest)
                    .with_context(|| format!("failed to unpack archive from {}", url))?;
            }
        }

        shell.status(
            Status::Installed,
            format!("{} ({})", spec.name, dest.display()),
        );
        Ok(dest)
    }
}

/// Download an archive to a staging file.
fn download(url: &Url, shell: &Arc<Shell>) -> Result<tempfile::NamedTempFile> {
    let mut response = reqwest::blocking::get(url.as_str())
        .with_context(|| format!("failed to download archive from {}", url))?;

    if !response.status().is_success() {
        bail!(
            "failed to download archive from {}: HTTP {}",
            url,
            response.status()
        );
    }

    let total = response.content_length().unwrap_or(0);
    let mut progress = shell.bytes_progress("Downloading", total);

    let mut staged =
        tempfile::NamedTempFile::new().context("failed to create staging file for download")?;
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = response
            .read(&mut buf)
            .context("failed to read download stream")?;
        if n == 0 {
            break;
        }
        staged
            .write_all(&buf[..n])
            .context("failed to write staged archive")?;
        progress.inc(n as u64);
    }
    progress.finish();

    Ok(staged)
}
