//! `slipway clean` command

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::CleanArgs;
use slipway::core::sdkconfig;
use slipway::ops::prepare::PrepareStep;
use slipway::util::shell::{Shell, Status};
use slipway::util::GlobalContext;

pub fn execute(args: CleanArgs, gctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let step = PrepareStep::load(gctx, args.env.as_deref(), None)?;

    step.store.remove(&step.libs_spec.name, shell)?;

    if args.marker {
        let marker = sdkconfig::marker_path(&step.project_dir);
        if marker.is_file() {
            std::fs::remove_file(&marker)
                .with_context(|| format!("failed to remove {}", marker.display()))?;
            shell.status(Status::Removed, marker.display());
        }
    }

    Ok(())
}
