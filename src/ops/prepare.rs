//! Implementation of `slipway prepare` and `slipway check`.
//!
//! Everything the original host runtime supplied ambiently is resolved
//! up front into a [`PrepareStep`]: the selected environment, its board
//! manifest, the merged custom sdkconfig, the package store, and the
//! hook commands. The prepare flow is then a straight line: bootstrap
//! Python dependencies, decide freshness, reinstall when stale, run the
//! framework-libs sub-build when the custom config calls for it, and
//! hand off to the board-specific framework build.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::core::board::BoardConfig;
use crate::core::package::PackageSpec;
use crate::core::project::{HooksConfig, ProjectConfig, PROJECT_FILE};
use crate::core::sdkconfig::{self, CustomSdkconfig};
use crate::ops::freshness::{needs_libs_build, FreshnessCheck, Verdict};
use crate::ops::pydeps::{ensure_python_deps, PydepsOptions};
use crate::sources::FrameworkStore;
use crate::util::process::{find_python, ProcessBuilder};
use crate::util::shell::{Shell, Status};
use crate::util::GlobalContext;

/// Gate variable consulted before the framework build hand-off.
pub const LIB_COMPILE_FLAG_VAR: &str = "SLIPWAY_LIB_COMPILE_FLAG";

/// Extra link unflags for single-core builds on dual-core silicon.
const SOLO_UNFLAGS: &[&str] = &["-mdisable-hardware-atomics", "-ustart_app_other_cores"];

/// Hooks the prepare flow can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    CompileLibs,
    FrameworkBuild,
}

impl Hook {
    /// The project-file key naming this hook.
    pub fn key(&self) -> &'static str {
        match self {
            Hook::CompileLibs => "hooks.compile_libs",
            Hook::FrameworkBuild => "hooks.framework_build",
        }
    }
}

/// All inputs of one prepare/check run, resolved from the project
/// file, the board manifest, CLI flags, and the environment.
#[derive(Debug, Clone)]
pub struct PrepareStep {
    pub project_dir: PathBuf,
    pub env_name: String,
    pub mcu: String,
    pub board: BoardConfig,
    pub custom: CustomSdkconfig,
    pub frameworks: Vec<String>,
    pub store: FrameworkStore,
    pub libs_spec: PackageSpec,
    pub sdkconfig_probe: String,
    pub python: Option<PathBuf>,
    pub hooks: HooksConfig,
}

impl PrepareStep {
    /// Resolve a step from the project containing `gctx.cwd()`.
    ///
    /// `python` is the CLI/environment override; it wins over the
    /// project file's `[python] exe`.
    pub fn load(
        gctx: &GlobalContext,
        env: Option<&str>,
        python: Option<PathBuf>,
    ) -> Result<PrepareStep> {
        let project_file = gctx.find_project_file()?;
        let project_dir = project_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| gctx.cwd().to_path_buf());
        let config = ProjectConfig::load(&project_file)?;

        let (env_name, env_config) = config.select_env(env)?;
        let env_name = env_name.to_string();

        let board = match &env_config.board {
            Some(path) => BoardConfig::load(&resolve_path(&project_dir, path))?,
            None => BoardConfig::empty(),
        };
        let mcu = board.mcu().to_string();

        let custom = CustomSdkconfig::from_sources(
            board.custom_sdkconfig().as_deref(),
            env_config.custom_sdkconfig.as_deref(),
        );

        let store_root = match gctx.packages_root_override() {
            Some(root) => root.to_path_buf(),
            None => match &config.framework.packages_root {
                Some(root) => resolve_path(&project_dir, root),
                None => gctx.packages_dir(),
            },
        };

        let libs_spec = PackageSpec::parse(&config.framework.libs_spec)
            .with_context(|| format!("invalid libs_spec in {}", PROJECT_FILE))?;

        Ok(PrepareStep {
            project_dir,
            env_name,
            mcu,
            board,
            custom,
            frameworks: env_config.frameworks.clone(),
            store: FrameworkStore::new(store_root),
            libs_spec,
            sdkconfig_probe: config.framework.sdkconfig_probe.clone(),
            python: python.or(config.python.exe.clone()),
            hooks: config.hooks.clone(),
        })
    }

    /// Fingerprint the current environment expects to find recorded.
    pub fn expected_fingerprint(&self) -> String {
        self.custom.fingerprint(&self.mcu)
    }

    /// Whether the installed libs package was ever built with custom
    /// config. False when the package is not installed at all.
    pub fn package_has_custom(&self) -> bool {
        self.store
            .package_dir(&self.libs_spec.name)
            .join(&self.sdkconfig_probe)
            .is_file()
    }

    /// Gather the freshness-decision inputs.
    pub fn freshness(&self) -> Result<FreshnessCheck> {
        Ok(FreshnessCheck {
            has_custom: self.custom.is_active(),
            package_has_custom: self.package_has_custom(),
            recorded: sdkconfig::read_recorded_fingerprint(&self.project_dir)?,
            expected: self.expected_fingerprint(),
        })
    }

    /// Extra link unflags this environment needs: single-core FreeRTOS
    /// on a solo-core variant of dual-core silicon drops the hardware
    /// atomics and the second app core entry point.
    pub fn solo_unflags(&self) -> Vec<String> {
        if self.custom.is_active()
            && self.board.has_define("CORE32SOLO1")
            && self.custom.wants_unicore()
        {
            SOLO_UNFLAGS.iter().map(|s| s.to_string()).collect()
        } else {
            Vec::new()
        }
    }

    /// The Python interpreter to use for the dependency bootstrap.
    pub fn python_exe(&self) -> Result<PathBuf> {
        if let Some(python) = &self.python {
            return Ok(python.clone());
        }
        find_python().ok_or_else(|| {
            anyhow::anyhow!(
                "no python interpreter found; install python3 or set `exe` under [python]"
            )
        })
    }

    /// Run a configured hook from the project directory.
    pub fn run_hook(&self, hook: Hook, shell: &Shell) -> Result<()> {
        let command = match hook {
            Hook::CompileLibs => self.hooks.compile_libs.as_deref(),
            Hook::FrameworkBuild => self.hooks.framework_build.as_deref(),
        };

        let Some(command) = command else {
            bail!("no `{}` hook configured in {}", hook.key(), PROJECT_FILE);
        };
        let words = split_command(command);
        let Some((program, args)) = words.split_first() else {
            bail!("`{}` hook is empty", hook.key());
        };

        shell.status(Status::Info, format!("running `{}`", command));
        tracing::debug!("running {} hook: {}", hook.key(), command);

        ProcessBuilder::new(program)
            .args(args)
            .cwd(&self.project_dir)
            .env("SLIPWAY_ENV", &self.env_name)
            .env("SLIPWAY_MCU", &self.mcu)
            .status_and_check()
            .with_context(|| format!("`{}` hook failed", hook.key()))
    }
}

fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Split a hook command line into words. Single or double quotes group
/// words containing whitespace; there is no other escape processing,
/// and an unterminated quote runs to the end of the line.
fn split_command(command: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut quote = None;

    for c in command.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            None => current.push(c),
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Whether the board-specific framework build runs after preparation:
/// the env builds with arduino (and not espidf), and the lib-compile
/// gate is `Inactive` (the unset default) or `True`.
pub fn framework_build_gate(frameworks: &[String], lib_compile_flag: Option<&str>) -> bool {
    let flag = lib_compile_flag.unwrap_or("Inactive");
    frameworks.iter().any(|f| f == "arduino")
        && !frameworks.iter().any(|f| f == "espidf")
        && (flag == "Inactive" || flag == "True")
}

/// Options for `slipway prepare`.
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    /// Skip the Python dependency bootstrap.
    pub skip_python_deps: bool,
}

/// What a prepare run did.
#[derive(Debug, Clone, Serialize)]
pub struct PrepareReport {
    pub env: String,
    pub mcu: String,
    pub fingerprint: String,
    pub verdict: Verdict,
    pub reinstalled: bool,
    pub libs_compiled: bool,
    pub framework_build_ran: bool,
    pub python_deps_installed: Vec<String>,
    pub build_unflags: Vec<String>,
}

/// Run the full preparation flow for one environment.
pub fn prepare(
    step: &PrepareStep,
    shell: &Arc<Shell>,
    opts: &PrepareOptions,
) -> Result<PrepareReport> {
    let span = shell.span(
        Status::Preparing,
        format!("env `{}` (mcu {})", step.env_name, step.mcu),
    );

    let python_deps_installed = if opts.skip_python_deps {
        Vec::new()
    } else {
        let python = step.python_exe()?;
        ensure_python_deps(&python, shell, &PydepsOptions::default())?
    };

    let build_unflags = step.solo_unflags();
    if !build_unflags.is_empty() {
        shell.status(
            Status::Info,
            format!("solo-core build unflags: {}", build_unflags.join(" ")),
        );
    }

    // A missing package cannot be probed for its custom state; install
    // it before deciding anything.
    let mut reinstalled = false;
    if !step.store.is_installed(&step.libs_spec.name) {
        step.store.install(&step.libs_spec, shell)?;
        reinstalled = true;
    }

    let check = step.freshness()?;
    let verdict = check.verdict();
    tracing::debug!(
        "freshness for `{}`: {:?} (expected {})",
        step.env_name,
        verdict,
        check.expected
    );

    // A package installed moments ago cannot be any fresher; only a
    // pre-existing install is worth replacing.
    if verdict.requires_reinstall() && !reinstalled {
        shell.status(Status::Info, format!("framework libs are {}", verdict));
        step.store.remove(&step.libs_spec.name, shell)?;
        step.store.install(&step.libs_spec, shell)?;
        reinstalled = true;
    }

    let libs_compiled = needs_libs_build(check.has_custom, check.package_has_custom, reinstalled);
    if libs_compiled {
        shell.status(
            Status::Compiling,
            format!("framework libs for `{}`", step.env_name),
        );
        step.run_hook(Hook::CompileLibs, shell)?;
        sdkconfig::write_marker(&step.project_dir, &check.expected, step.custom.text())?;
    }

    let lib_compile_flag = std::env::var(LIB_COMPILE_FLAG_VAR).ok();
    let framework_build_ran = framework_build_gate(&step.frameworks, lib_compile_flag.as_deref());
    if framework_build_ran {
        step.run_hook(Hook::FrameworkBuild, shell)?;
    }

    span.finish_with_message(format!("env `{}`", step.env_name));

    Ok(PrepareReport {
        env: step.env_name.clone(),
        mcu: step.mcu.clone(),
        fingerprint: check.expected.clone(),
        verdict,
        reinstalled,
        libs_compiled,
        framework_build_ran,
        python_deps_installed,
        build_unflags,
    })
}

/// What a check run found.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub env: String,
    pub mcu: String,
    pub has_custom: bool,
    pub package_has_custom: bool,
    pub recorded: Option<String>,
    pub expected: String,
    pub verdict: Verdict,
}

/// Run the freshness decision without side effects.
pub fn check(step: &PrepareStep) -> Result<CheckReport> {
    let check = step.freshness()?;
    let verdict = check.verdict();

    Ok(CheckReport {
        env: step.env_name.clone(),
        mcu: step.mcu.clone(),
        has_custom: check.has_custom,
        package_has_custom: check.package_has_custom,
        recorded: check.recorded,
        expected: check.expected,
        verdict,
    })
}
