//! `slipway run` command
//!
//! Runs a batch of shell commands as parallel jobs with buffered output.
//! Each command gets its own `sh -c` invocation; output appears per job,
//! never interleaved.

use anyhow::Result;

use crate::cli::RunArgs;
use slipway::env::BuildEnv;
use slipway::exec::JobSet;
use slipway::util::process::ProcessBuilder;

pub fn execute(env: &BuildEnv, args: RunArgs) -> Result<()> {
    let jobs = args.jobs.or(env.jobs());

    let mut set = JobSet::new(env.shell_arc(), jobs);
    for command in &args.commands {
        set.push(ProcessBuilder::new("sh").arg("-c").arg(command));
    }

    set.run()
}
