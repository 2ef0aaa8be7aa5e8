//! `slipway version` command
//!
//! Prints one version string scraped from the engine headers under the
//! project root. Probes that find nothing still print, with `X` standing
//! in for the missing part; only the build counter insists on its header.

use anyhow::Result;
use serde_json::json;

use crate::cli::{VersionArgs, VersionCommands};
use slipway::env::BuildEnv;

pub fn execute(env: &BuildEnv, args: VersionArgs) -> Result<()> {
    let (kind, version) = match args.kind {
        VersionCommands::Engine => ("engine", env.engine_version()?),
        VersionCommands::Protocol => ("protocol", env.protocol_version()?),
        VersionCommands::Build => ("build", env.build_version()?),
    };

    let shell = env.shell();
    if shell.is_json() {
        shell.json_event(&json!({
            "reason": "version",
            "kind": kind,
            "version": version,
        }));
    } else {
        shell.raw(&version);
    }

    Ok(())
}
