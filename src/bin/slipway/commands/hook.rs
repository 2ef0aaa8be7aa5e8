//! `slipway hook` command
//!
//! Runs one configured packaging hook by name. Hooks with no configured
//! commands fail loudly rather than pretending the step ran.

use anyhow::Result;

use crate::cli::HookArgs;
use slipway::env::BuildEnv;
use slipway::hooks::HookKind;
use slipway::util::shell::Status;

pub fn execute(env: &BuildEnv, args: HookArgs) -> Result<()> {
    let kind: HookKind = args.hook.parse().map_err(anyhow::Error::msg)?;

    env.shell()
        .status(Status::Running, format!("hook {}", kind.as_str()));
    env.run_hook(kind)?;
    env.shell()
        .status(Status::Finished, format!("hook {}", kind.as_str()));

    Ok(())
}
