//! Configuration-freshness decision.
//!
//! Given what the current environment declares, what the installed
//! package was built with, and the fingerprint recorded by the last
//! build, decide whether the installed framework package is stale:
//!
//! | env has custom | package ever had custom | fingerprint | outcome |
//! |---|---|---|---|
//! | no  | no  | n/a                 | fresh |
//! | no  | yes | n/a                 | reinstall (drop stale custom config) |
//! | yes | any | match               | fresh |
//! | yes | any | no match or missing | reinstall |
//!
//! When the env has custom config and the package never had any, the
//! comparison is vacuously fresh; the first custom libs build is
//! triggered by [`needs_libs_build`] instead.

use std::fmt;

use serde::Serialize;

/// Inputs to the freshness decision.
#[derive(Debug, Clone)]
pub struct FreshnessCheck {
    /// Current environment declares custom sdkconfig.
    pub has_custom: bool,

    /// The installed package was ever built with custom sdkconfig
    /// (probe file present).
    pub package_has_custom: bool,

    /// Fingerprint recorded in the marker artifact, if any.
    pub recorded: Option<String>,

    /// Fingerprint expected for the current environment.
    pub expected: String,
}

/// Outcome of the freshness decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verdict {
    /// Installed package matches the current environment.
    Fresh,

    /// The package carries custom config the current environment does
    /// not declare.
    StaleCustomConfig,

    /// The recorded fingerprint is missing or differs from the expected
    /// one.
    ConfigDrift {
        recorded: Option<String>,
        expected: String,
    },
}

impl Verdict {
    /// Whether this verdict forces a reinstall.
    pub fn requires_reinstall(&self) -> bool {
        !matches!(self, Verdict::Fresh)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Fresh => write!(f, "fresh"),
            Verdict::StaleCustomConfig => write!(
                f,
                "stale (installed package was built with custom config, env declares none)"
            ),
            Verdict::ConfigDrift {
                recorded: Some(recorded),
                expected,
            } => write!(f, "drift (recorded {}, expected {})", recorded, expected),
            Verdict::ConfigDrift {
                recorded: None,
                expected,
            } => write!(f, "drift (no fingerprint recorded, expected {})", expected),
        }
    }
}

impl FreshnessCheck {
    /// Apply the decision table.
    pub fn verdict(&self) -> Verdict {
        if !self.has_custom {
            if self.package_has_custom {
                return Verdict::StaleCustomConfig;
            }
            return Verdict::Fresh;
        }

        if !self.package_has_custom {
            // Nothing custom was ever applied to the installed
            // package, so there is no recorded state to drift from.
            return Verdict::Fresh;
        }

        if self.recorded.as_deref() == Some(self.expected.as_str()) {
            Verdict::Fresh
        } else {
            Verdict::ConfigDrift {
                recorded: self.recorded.clone(),
                expected: self.expected.clone(),
            }
        }
    }
}

/// Whether the framework-libs sub-build must run.
///
/// Computed once per invocation: after a reinstall with custom config
/// active, or on the first custom build against a package that never
/// had custom config. At most one trigger per run.
pub fn needs_libs_build(has_custom: bool, package_has_custom: bool, reinstalled: bool) -> bool {
    has_custom && (reinstalled || !package_has_custom)
}
