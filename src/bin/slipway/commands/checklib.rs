//! `slipway check-lib` command
//!
//! Runs the `ldd -r` undefined-symbol check against one shared library.
//! The explicit invocation always checks, even when `[check] enabled` turns
//! the automatic post-link validation off; the config gate decides whether
//! builds attach the check, not whether the user may run it by hand.

use anyhow::Result;

use crate::cli::CheckLibArgs;
use slipway::env::BuildEnv;
use slipway::linker::LinkCheck;
use slipway::util::shell::Status;

pub fn execute(env: &BuildEnv, args: CheckLibArgs) -> Result<()> {
    let mut allowed: Vec<String> = env.allowed_symbols().to_vec();
    allowed.extend(args.allow);

    let check = LinkCheck::new(allowed);
    check.validate(&args.library, env.shell())?;

    env.shell()
        .status(Status::Validated, args.library.display());

    Ok(())
}
