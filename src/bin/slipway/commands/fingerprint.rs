//! `slipway fingerprint` command
//!
//! Prints the fingerprint the selected environment expects, for use in
//! scripts and for debugging stale-marker reports.

use anyhow::Result;

use crate::cli::FingerprintArgs;
use slipway::ops::prepare::PrepareStep;
use slipway::util::GlobalContext;

pub fn execute(args: FingerprintArgs, gctx: &GlobalContext) -> Result<()> {
    let step = PrepareStep::load(gctx, args.env.as_deref(), None)?;

    println!("{}", step.expected_fingerprint());

    Ok(())
}
