//! `slipway deps` command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::DepsArgs;
use slipway::core::project::ProjectConfig;
use slipway::ops::pydeps::{ensure_python_deps, PydepsOptions};
use slipway::util::process::find_python;
use slipway::util::shell::{Shell, Status};
use slipway::util::GlobalContext;

pub fn execute(args: DepsArgs, gctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let python = resolve_python(args.python, gctx)?;

    let opts = PydepsOptions {
        dry_run: args.dry_run,
    };
    let specs = ensure_python_deps(&python, shell, &opts)?;

    if specs.is_empty() {
        shell.status(Status::Finished, "python dependencies up to date");
    } else if args.dry_run {
        shell.status(Status::Skipped, format!("dry run: {}", specs.join(", ")));
    } else {
        shell.status(Status::Finished, format!("installed {}", specs.join(", ")));
    }

    Ok(())
}

/// Interpreter precedence: --python (or SLIPWAY_PYTHON), then the
/// project file's `[python] exe` when run inside a project, then a
/// PATH lookup.
fn resolve_python(cli: Option<PathBuf>, gctx: &GlobalContext) -> Result<PathBuf> {
    if let Some(python) = cli {
        return Ok(python);
    }

    if let Ok(project_file) = gctx.find_project_file() {
        let config = ProjectConfig::load(&project_file)?;
        if let Some(python) = config.python.exe {
            return Ok(python);
        }
    }

    find_python().ok_or_else(|| {
        anyhow::anyhow!("no python interpreter found; install python3 or pass --python")
    })
}
