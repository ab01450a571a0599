//! `slipway prepare` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::PrepareArgs;
use slipway::ops::prepare::{prepare, PrepareOptions, PrepareStep};
use slipway::util::shell::Shell;
use slipway::util::GlobalContext;

pub fn execute(args: PrepareArgs, gctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let step = PrepareStep::load(gctx, args.env.as_deref(), args.python)?;

    let opts = PrepareOptions {
        skip_python_deps: args.skip_python_deps,
    };

    prepare(&step, shell, &opts)?;

    Ok(())
}
