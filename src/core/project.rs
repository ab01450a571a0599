//! slipway.toml project file parsing and schema.
//!
//! The project file holds per-environment build options plus the
//! framework, python, and hook settings shared by all environments.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

/// Canonical project file name.
pub const PROJECT_FILE: &str = "slipway.toml";

/// Default probe path, relative to the installed framework-libs package,
/// whose existence records that the package was built with custom config.
pub const DEFAULT_SDKCONFIG_PROBE: &str = "tools/esp32-arduino-libs/sdkconfig";

/// Errors raised while locating the project file or selecting an
/// environment from it.
#[derive(Debug, Error, Diagnostic)]
pub enum ProjectError {
    #[error("could not find `{PROJECT_FILE}` in `{dir}` or any parent directory", dir = .dir.display())]
    #[diagnostic(
        code(slipway::project::not_found),
        help("run slipway from inside a project, or pass --project-dir")
    )]
    NotFound { dir: PathBuf },

    #[error("`{PROJECT_FILE}` defines no [env.*] sections")]
    #[diagnostic(
        code(slipway::project::no_env),
        help("add at least one [env.<name>] section")
    )]
    NoEnvironments,

    #[error("no environment named `{name}` (available: {available})")]
    #[diagnostic(
        code(slipway::project::unknown_env),
        help("pick one of the environments defined in the project file")
    )]
    UnknownEnv { name: String, available: String },

    #[error("multiple environments defined and no default set (available: {available})")]
    #[diagnostic(
        code(slipway::project::no_default_env),
        help("pass --env <name> or set `default_env` under [project]")
    )]
    NoDefaultEnv { available: String },
}

/// Parsed contents of slipway.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Top-level project settings.
    #[serde(default)]
    pub project: ProjectSection,

    /// Framework package settings.
    pub framework: FrameworkConfig,

    /// Python interpreter settings.
    #[serde(default)]
    pub python: PythonConfig,

    /// Hook commands run on the project's behalf.
    #[serde(default)]
    pub hooks: HooksConfig,

    /// Build environments, keyed by name.
    #[serde(default)]
    pub env: BTreeMap<String, EnvConfig>,
}

/// The [project] section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectSection {
    /// Environment used when --env is not passed.
    #[serde(default)]
    pub default_env: Option<String>,
}

/// The [framework] section.
#[derive(Debug, Clone, Deserialize)]
pub struct FrameworkConfig {
    /// Package spec for the framework-libs package, e.g.
    /// `framework-arduinoespressif32-libs @ uri=https://.../libs.tar.gz`.
    pub libs_spec: String,

    /// Probe path inside the installed libs package marking that it was
    /// built with custom config.
    #[serde(default = "default_sdkconfig_probe")]
    pub sdkconfig_probe: String,

    /// Root directory for installed packages. Relative paths are
    /// resolved against the project directory. Overridden by
    /// --packages-root / SLIPWAY_PACKAGES_ROOT.
    #[serde(default)]
    pub packages_root: Option<PathBuf>,
}

fn default_sdkconfig_probe() -> String {
    DEFAULT_SDKCONFIG_PROBE.to_string()
}

/// The [python] section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PythonConfig {
    /// Explicit interpreter path. Falls back to a PATH search for
    /// `python3` then `python`.
    #[serde(default)]
    pub exe: Option<PathBuf>,
}

/// The [hooks] section.
///
/// Hook values are command lines run from the project directory with
/// SLIPWAY_ENV and SLIPWAY_MCU exported. Commands are split on
/// whitespace, with single or double quotes grouping words; no shell
/// is involved.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HooksConfig {
    /// Builds the framework libs against the active custom config.
    #[serde(default)]
    pub compile_libs: Option<String>,

    /// Board-specific framework build, run after preparation.
    #[serde(default)]
    pub framework_build: Option<String>,
}

/// One [env.<name>] section.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvConfig {
    /// Board manifest (JSON), relative to the project directory.
    #[serde(default)]
    pub board: Option<PathBuf>,

    /// Custom sdkconfig lines for this environment.
    #[serde(default)]
    pub custom_sdkconfig: Option<String>,

    /// Frameworks this environment builds with.
    #[serde(default = "default_frameworks")]
    pub frameworks: Vec<String>,
}

fn default_frameworks() -> Vec<String> {
    vec!["arduino".to_string()]
}

impl ProjectConfig {
    /// Load and parse a project file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = crate::util::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse project file contents.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: ProjectConfig = toml::from_str(content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Select an environment by name, falling back to the configured
    /// default, then to the only environment when exactly one exists.
    pub fn select_env(&self, requested: Option<&str>) -> Result<(&str, &EnvConfig), ProjectError> {
        if self.env.is_empty() {
            return Err(ProjectError::NoEnvironments);
        }

        let name = match requested.or(self.project.default_env.as_deref()) {
            Some(name) => name,
            None if self.env.len() == 1 => {
                // Sole environment, no ambiguity.
                let (name, env) = self.env.iter().next().ok_or(ProjectError::NoEnvironments)?;
                return Ok((name, env));
            }
            None => {
                return Err(ProjectError::NoDefaultEnv {
                    available: self.available_envs(),
                });
            }
        };

        match self.env.get_key_value(name) {
            Some((name, env)) => Ok((name, env)),
            None => Err(ProjectError::UnknownEnv {
                name: name.to_string(),
                available: self.available_envs(),
            }),
        }
    }

    fn available_envs(&self) -> String {
        self.env.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [project]
        default_env = "esp32dev"

        [framework]
        libs_spec = "framework-arduinoespressif32-libs @ uri=https://example.com/libs.tar.gz"

        [python]
        exe = "/usr/bin/python3"

        [hooks]
        compile_libs = "pio run -t build-libs"
        framework_build = "pio run"

        [env.esp32dev]
        board = "boards/esp32dev.json"
        frameworks = ["arduino"]

        [env.esp32s3]
        board = "boards/esp32s3.json"
        custom_sdkconfig = "CONFIG_FREERTOS_UNICORE=y"
    "#;

    fn parse(content: &str) -> ProjectConfig {
        ProjectConfig::parse(content, Path::new(PROJECT_FILE)).unwrap()
    }

    #[test]
    fn test_parse_full() {
        let config = parse(FULL);
        assert_eq!(config.project.default_env.as_deref(), Some("esp32dev"));
        assert_eq!(config.env.len(), 2);
        assert_eq!(config.framework.sdkconfig_probe, DEFAULT_SDKCONFIG_PROBE);
        assert_eq!(
            config.hooks.compile_libs.as_deref(),
            Some("pio run -t build-libs")
        );
        assert_eq!(
            config.env["esp32s3"].custom_sdkconfig.as_deref(),
            Some("CONFIG_FREERTOS_UNICORE=y")
        );
    }

    #[test]
    fn test_frameworks_default_to_arduino() {
        let config = parse(FULL);
        assert_eq!(config.env["esp32s3"].frameworks, vec!["arduino"]);
    }

    #[test]
    fn test_missing_framework_section_fails() {
        let result = ProjectConfig::parse("[env.a]\n", Path::new(PROJECT_FILE));
        assert!(result.is_err());
    }

    #[test]
    fn test_select_env_explicit() {
        let config = parse(FULL);
        let (name, _) = config.select_env(Some("esp32s3")).unwrap();
        assert_eq!(name, "esp32s3");
    }

    #[test]
    fn test_select_env_default() {
        let config = parse(FULL);
        let (name, _) = config.select_env(None).unwrap();
        assert_eq!(name, "esp32dev");
    }

    #[test]
    fn test_select_env_sole() {
        let config = parse(
            r#"
            [framework]
            libs_spec = "libs @ uri=https://example.com/libs.tar.gz"

            [env.only]
            "#,
        );
        let (name, _) = config.select_env(None).unwrap();
        assert_eq!(name, "only");
    }

    #[test]
    fn test_select_env_unknown() {
        let config = parse(FULL);
        let err = config.select_env(Some("esp8266")).unwrap_err();
        assert!(matches!(err, ProjectError::UnknownEnv { .. }));
        assert!(err.to_string().contains("esp32dev, esp32s3"));
    }

    #[test]
    fn test_select_env_no_default_among_many() {
        let mut config = parse(FULL);
        config.project.default_env = None;
        let err = config.select_env(None).unwrap_err();
        assert!(matches!(err, ProjectError::NoDefaultEnv { .. }));
    }

    #[test]
    fn test_select_env_empty() {
        let config = parse(
            r#"
            [framework]
            libs_spec = "libs @ uri=https://example.com/libs.tar.gz"
            "#,
        );
        assert!(matches!(
            config.select_env(None),
            Err(ProjectError::NoEnvironments)
        ));
    }
}
