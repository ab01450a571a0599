//! PEP 440 to semver coercion.
//!
//! pip reports distribution versions in PEP 440 form (`6.0.2.post1`,
//! `2.3.0b1`, `24.2`). Requirement matching happens in semver, so
//! reported versions are normalized first: the release/pre-release
//! boundary is rewritten into a semver pre-release (`6.0.2-post.1`),
//! then the result is coerced by padding missing components.
//!
//! Versions that survive neither step are treated as not satisfying any
//! requirement, which at worst re-installs a package that was fine.

use std::sync::LazyLock;

use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version};

/// Matches the first PEP 440 pre/dev/post segment after a numeric
/// component, e.g. the `.post1` in `6.0.2.post1` or the `b1` in `2.3.0b1`.
static PRE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\.\d+)\.?(dev|a|b|rc|post)").expect("static regex"));

/// Convert a PEP 440 version string to a semver [`Version`].
///
/// Returns `None` when the string cannot be coerced (epoch markers,
/// non-numeric release components, malformed pre-release tags).
pub fn pepver_to_semver(pepver: &str) -> Option<Version> {
    let trimmed = pepver.trim();
    if trimmed.is_empty() {
        return None;
    }

    // PEP 440 local version labels ("1.2.3+ubuntu1") map onto semver
    // build metadata.
    let (trimmed, local) = match trimmed.split_once('+') {
        Some((v, local)) => (v, Some(local)),
        None => (trimmed, None),
    };

    let normalized = PRE_SEGMENT.replace(trimmed, "$1-$2.");
    coerce(&normalized, local)
}

/// Pad a dotted numeric version (with an optional `-pre` tail) out to
/// full `major.minor.patch` semver form.
fn coerce(version: &str, local: Option<&str>) -> Option<Version> {
    let (release, pre) = match version.split_once('-') {
        Some((release, pre)) => (release, Some(pre)),
        None => (version, None),
    };

    let mut components = release.split('.');
    let major: u64 = components.next()?.parse().ok()?;
    let minor: u64 = match components.next() {
        Some(c) => c.parse().ok()?,
        None => 0,
    };
    let patch: u64 = match components.next() {
        Some(c) => c.parse().ok()?,
        None => 0,
    };

    // Release segments beyond the third ("1.2.3.4") carry no semver
    // meaning; keep them as build metadata so nothing is silently lost.
    let extra: Vec<&str> = components.collect();

    let mut version = Version::new(major, minor, patch);

    if let Some(pre) = pre {
        version.pre = Prerelease::new(pre).ok()?;
    }

    let build = match (extra.is_empty(), local) {
        (true, None) => None,
        (true, Some(local)) => Some(local.replace(['+', '_'], ".")),
        (false, None) => Some(extra.join(".")),
        (false, Some(local)) => Some(format!("{}.{}", extra.join("."), local)),
    };
    if let Some(build) = build {
        version.build = BuildMetadata::new(&build).ok()?;
    }

    Some(version)
}
