//! `slipway check` command
//!
//! Exits with status 1 when the installed framework libs would need a
//! reinstall, so CI can gate on it.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::CheckArgs;
use slipway::ops::prepare::{check, PrepareStep};
use slipway::util::shell::{Shell, Status};
use slipway::util::GlobalContext;

pub fn execute(args: CheckArgs, gctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let step = PrepareStep::load(gctx, args.env.as_deref(), None)?;
    let report = check(&step)?;

    if args.json {
        let mut stdout = std::io::stdout();
        serde_json::to_writer_pretty(&mut stdout, &report)?;
        writeln!(stdout)?;
        stdout.flush()?;
    } else {
        let status = if report.verdict.requires_reinstall() {
            Status::Warning
        } else {
            Status::Finished
        };
        shell.status(
            Status::Checking,
            format!("env `{}` (mcu {})", report.env, report.mcu),
        );
        shell.status(
            status,
            format!("framework libs are {}", report.verdict),
        );
    }

    if report.verdict.requires_reinstall() {
        std::process::exit(1);
    }

    Ok(())
}
