//! `slipway sources` command
//!
//! Extracts the compilable source list from a project file and prints one
//! path per line, ready for a build script to consume.

use anyhow::Result;
use serde_json::json;

use crate::cli::SourcesArgs;
use slipway::env::BuildEnv;
use slipway::project;
use slipway::util::shell::Status;

pub fn execute(env: &BuildEnv, args: SourcesArgs) -> Result<()> {
    env.shell()
        .status(Status::Extracting, args.project_file.display());
    let mut sources = project::extract_sources(&args.project_file)?;

    if let Some(prefix) = &args.prefix {
        sources = sources
            .into_iter()
            .map(|s| format!("{}/{}", prefix, s))
            .collect();
    }

    let shell = env.shell();
    if shell.is_json() {
        shell.json_event(&json!({
            "reason": "source-list",
            "project_file": args.project_file.display().to_string(),
            "sources": sources,
        }));
        return Ok(());
    }

    for source in &sources {
        shell.raw(source);
    }

    Ok(())
}
