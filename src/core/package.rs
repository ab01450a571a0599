//! Framework package specs.
//!
//! A spec names the framework-libs package and, for reinstalls, the
//! archive URI to fetch it from: `[owner/]name[ @ requirement]`, where
//! the requirement is either `uri=<url>`, a bare URL, or a semver
//! requirement. A bare URL is also accepted as a whole spec, with the
//! package name taken from the archive file stem.

use std::fmt;
use std::str::FromStr;

use miette::Diagnostic;
use semver::VersionReq;
use thiserror::Error;
use url::Url;

/// Errors raised while parsing a package spec or deriving its URL.
#[derive(Debug, Error, Diagnostic)]
pub enum SpecError {
    #[error("empty package spec")]
    #[diagnostic(code(slipway::spec::empty))]
    Empty,

    #[error("invalid package name `{name}`")]
    #[diagnostic(
        code(slipway::spec::invalid_name),
        help("names may contain letters, digits, `-`, `_`, and `.`")
    )]
    InvalidName { name: String },

    #[error("invalid uri `{uri}`")]
    #[diagnostic(code(slipway::spec::invalid_uri))]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid version requirement `{requirement}`")]
    #[diagnostic(code(slipway::spec::invalid_requirement))]
    InvalidRequirement {
        requirement: String,
        #[source]
        source: semver::Error,
    },

    #[error("package spec `{spec}` has no uri")]
    #[diagnostic(
        code(slipway::spec::missing_uri),
        help("reinstalling needs an archive URL; add ` @ uri=<archive-url>` to the spec")
    )]
    MissingUri { spec: String },
}

/// A parsed package spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Optional owner / namespace.
    pub owner: Option<String>,

    /// Package name; also the directory name under the packages root.
    pub name: String,

    /// Semver requirement, when the spec pins one.
    pub requirement: Option<VersionReq>,

    /// Archive URI, when the spec carries one.
    pub uri: Option<Url>,
}

impl PackageSpec {
    /// Parse a spec string.
    pub fn parse(spec: &str) -> Result<Self, SpecError> {
        spec.parse()
    }

    /// The archive URL reinstalls fetch from.
    pub fn download_url(&self) -> Result<&Url, SpecError> {
        self.uri.as_ref().ok_or_else(|| SpecError::MissingUri {
            spec: self.to_string(),
        })
    }
}

impl FromStr for PackageSpec {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SpecError::Empty);
        }

        // A bare URL is a complete spec; the name comes from the
        // archive file stem.
        if has_url_scheme(s) {
            let uri = parse_url(s)?;
            let name = archive_stem(&uri)?;
            return Ok(PackageSpec {
                owner: None,
                name,
                requirement: None,
                uri: Some(uri),
            });
        }

        let (id, requirement) = match s.split_once('@') {
            Some((id, req)) => (id.trim(), Some(req.trim())),
            None => (s, None),
        };

        let (owner, name) = match id.split_once('/') {
            Some((owner, name)) => (Some(owner.trim()), name.trim()),
            None => (None, id),
        };

        if !is_valid_name(name) {
            return Err(SpecError::InvalidName {
                name: name.to_string(),
            });
        }
        if let Some(owner) = owner {
            if !is_valid_name(owner) {
                return Err(SpecError::InvalidName {
                    name: owner.to_string(),
                });
            }
        }

        let mut spec = PackageSpec {
            owner: owner.map(str::to_string),
            name: name.to_string(),
            requirement: None,
            uri: None,
        };

        match requirement {
            Some(req) if req.starts_with("uri=") => {
                spec.uri = Some(parse_url(&req["uri=".len()..])?);
            }
            Some(req) if has_url_scheme(req) => {
                spec.uri = Some(parse_url(req)?);
            }
            Some(req) => {
                spec.requirement = Some(VersionReq::parse(req).map_err(|source| {
                    SpecError::InvalidRequirement {
                        requirement: req.to_string(),
                        source,
                    }
                })?);
            }
            None => {}
        }

        Ok(spec)
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(owner) = &self.owner {
            write!(f, "{}/", owner)?;
        }
        write!(f, "{}", self.name)?;
        if let Some(uri) = &self.uri {
            write!(f, " @ uri={}", uri)?;
        } else if let Some(req) = &self.requirement {
            write!(f, " @ {}", req)?;
        }
        Ok(())
    }
}

fn has_url_scheme(s: &str) -> bool {
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| s.starts_with(scheme))
}

fn parse_url(s: &str) -> Result<Url, SpecError> {
    let s = s.trim();
    Url::parse(s).map_err(|source| SpecError::InvalidUri {
        uri: s.to_string(),
        source,
    })
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Derive a package name from the last path segment of an archive URL.
fn archive_stem(url: &Url) -> Result<String, SpecError> {
    let segment = url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .unwrap_or("");

    let stem = segment
        .strip_suffix(".tar.gz")
        .or_else(|| segment.strip_suffix(".tgz"))
        .unwrap_or(segment);

    if !is_valid_name(stem) {
        return Err(SpecError::InvalidName {
            name: stem.to_string(),
        });
    }
    Ok(stem.to_string())
}
