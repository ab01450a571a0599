//! Custom sdkconfig handling: merge, fingerprint, marker artifact.
//!
//! An environment's effective custom sdkconfig merges two sources:
//! lines carried by the board manifest and lines set on the env in the
//! project file, board first. The fingerprint of that text plus the MCU
//! identifier is recorded as the first line of `sdkconfig.defaults` in
//! the project directory; comparing the recorded value against the
//! expected one is how configuration drift is detected between builds.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::fs;
use crate::util::hash::{is_short_fingerprint, short_fingerprint};

/// First-line prefix of the marker artifact.
pub const MARKER_PREFIX: &str = "# SLIPWAY__";

/// Marker artifact file name, relative to the project directory.
pub const MARKER_FILE: &str = "sdkconfig.defaults";

/// The effective custom sdkconfig of one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSdkconfig {
    text: String,
    active: bool,
}

impl CustomSdkconfig {
    /// Merge the board-supplied and env-supplied custom sdkconfig.
    ///
    /// Board lines come first, then env lines, joined by a newline and
    /// trimmed. The result is active when the env option is present at
    /// all, or when the board value is non-empty after trimming.
    pub fn from_sources(board: Option<&str>, env: Option<&str>) -> Self {
        let board = board.map(str::trim).filter(|s| !s.is_empty());
        let active = env.is_some() || board.is_some();

        let text = match (board, env) {
            (Some(b), Some(e)) => format!("{}\n{}", b, e),
            (Some(b), None) => b.to_string(),
            (None, Some(e)) => e.to_string(),
            (None, None) => String::new(),
        };

        CustomSdkconfig {
            text: text.trim().to_string(),
            active,
        }
    }

    /// An inactive, empty config.
    pub fn none() -> Self {
        CustomSdkconfig {
            text: String::new(),
            active: false,
        }
    }

    /// Whether this environment declares custom config at all.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The merged, trimmed config text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Fingerprint of this config for the given MCU: the first 16 hex
    /// characters of `md5(text ++ mcu)`.
    pub fn fingerprint(&self, mcu: &str) -> String {
        short_fingerprint(&format!("{}{}", self.text, mcu))
    }

    /// Whether the config pins the single-core FreeRTOS scheduler.
    pub fn wants_unicore(&self) -> bool {
        self.text.contains("CONFIG_FREERTOS_UNICORE=y")
    }
}

/// Path of the marker artifact for a project.
pub fn marker_path(project_dir: &Path) -> PathBuf {
    project_dir.join(MARKER_FILE)
}

/// Read the fingerprint recorded in the marker artifact.
///
/// Only the first line is considered. A missing file, a first line
/// without the marker prefix, or a malformed fingerprint all read as
/// `None` (not matching).
pub fn read_recorded_fingerprint(project_dir: &Path) -> Result<Option<String>> {
    let path = marker_path(project_dir);
    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let first_line = content.lines().next().unwrap_or("");

    let recorded = match first_line.strip_prefix(MARKER_PREFIX) {
        Some(rest) => rest.trim(),
        None => return Ok(None),
    };

    if is_short_fingerprint(recorded) {
        Ok(Some(recorded.to_string()))
    } else {
        Ok(None)
    }
}

/// Write the marker artifact: the fingerprint line followed by the
/// custom config text that produced it.
pub fn write_marker(project_dir: &Path, fingerprint: &str, text: &str) -> Result<()> {
    let mut content = format!("{}{}\n", MARKER_PREFIX, fingerprint);
    if !text.is_empty() {
        content.push_str(text);
        content.push('\n');
    }
    fs::write_string(&marker_path(project_dir), &content)
}
