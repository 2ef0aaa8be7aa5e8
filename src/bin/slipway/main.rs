//! Slipway CLI - build-orchestration helpers for C/C++ projects

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use slipway::env::BuildEnv;
use slipway::project::ProjectFileError;
use slipway::util::config::{self, Config};
use slipway::util::shell::{ColorChoice, Shell};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        // Parse errors carry a source span; render those through miette.
        match e.downcast::<ProjectFileError>() {
            Ok(diag) => eprintln!("{:?}", miette::Report::new(diag)),
            Err(e) => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("slipway=debug")
    } else {
        EnvFilter::new("slipway=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Completions need no environment
    if let Commands::Completions(args) = cli.command {
        return commands::completions::execute(args);
    }

    let root = match cli.project_root {
        Some(root) => root,
        None => std::env::current_dir().context("failed to determine current directory")?,
    };

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let global = config::global_config_path().unwrap_or_default();
            let project = config::project_config_path(&root);
            config::load_config(&global, &project)
        }
    };

    // CLI color flag wins over the configured default
    let color = match &cli.color {
        Some(s) => s
            .parse::<ColorChoice>()
            .map_err(|e| anyhow::anyhow!(e))?,
        None => config.color().unwrap_or_default(),
    };
    let json = match cli.message_format.as_deref() {
        None | Some("human") => false,
        Some("json") => true,
        Some(other) => anyhow::bail!(
            "invalid message format '{}'; expected 'human' or 'json'",
            other
        ),
    };
    let shell = Arc::new(Shell::from_flags(cli.quiet, cli.verbose, color, json));

    let env = BuildEnv::from_config(root, config, shell);

    // Execute command
    match cli.command {
        Commands::Sources(args) => commands::sources::execute(&env, args),
        Commands::Version(args) => commands::version::execute(&env, args),
        Commands::CheckLib(args) => commands::checklib::execute(&env, args),
        Commands::M4(args) => commands::m4::execute(&env, args),
        Commands::Hook(args) => commands::hook::execute(&env, args),
        Commands::Run(args) => commands::run::execute(&env, args),
        Commands::Completions(_) => unreachable!("handled above"),
    }
}
