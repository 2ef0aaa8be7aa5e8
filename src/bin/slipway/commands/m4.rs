//! `slipway m4` command
//!
//! Expands one `.m4` template in place, writing the result next to the
//! input with the `.m4` suffix stripped. Definitions come from the merged
//! config, with `-D` flags layered on top.

use anyhow::{bail, Result};
use serde_json::json;

use crate::cli::M4Args;
use slipway::env::BuildEnv;
use slipway::util::shell::Status;

pub fn execute(env: &BuildEnv, args: M4Args) -> Result<()> {
    let mut expander = env.m4_expander();
    for define in &args.defines {
        let Some((key, value)) = define.split_once('=') else {
            bail!("invalid define '{}'; expected KEY=VALUE", define);
        };
        expander = expander.define(key, value);
    }

    let output = expander.expand(&args.template, env.shell())?;

    let shell = env.shell();
    if shell.is_json() {
        shell.json_event(&json!({
            "reason": "m4-expanded",
            "template": args.template.display().to_string(),
            "output": output.display().to_string(),
        }));
    } else {
        shell.status(Status::Expanded, output.display());
    }

    Ok(())
}
