//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Slipway - build-orchestration helpers for C/C++ projects
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress status output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color mode: auto, always, never
    #[arg(long, global = true, value_name = "WHEN")]
    pub color: Option<String>,

    /// Emit machine-readable JSON events instead of human output
    #[arg(long, global = true, value_name = "FMT")]
    pub message_format: Option<String>,

    /// Use this config file instead of the global + project pair
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Project root directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project_root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the compilable sources from a project file
    Sources(SourcesArgs),

    /// Print a version string extracted from the engine headers
    Version(VersionArgs),

    /// Validate a freshly linked shared library with `ldd -r`
    CheckLib(CheckLibArgs),

    /// Expand an m4 template next to its input
    M4(M4Args),

    /// Run a configured packaging hook
    Hook(HookArgs),

    /// Run a batch of shell commands with buffered output
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct SourcesArgs {
    /// Project file to extract from
    pub project_file: PathBuf,

    /// Prefix each extracted path with this directory
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args)]
pub struct VersionArgs {
    #[command(subcommand)]
    pub kind: VersionCommands,
}

#[derive(Subcommand)]
pub enum VersionCommands {
    /// Engine version from the licensee header
    Engine,

    /// Network protocol version as major.minor
    Protocol,

    /// Build counter from the generated build header
    Build,
}

#[derive(Args)]
pub struct CheckLibArgs {
    /// Shared library to validate
    pub library: PathBuf,

    /// Tolerate this undefined symbol (in addition to the configured list)
    #[arg(long = "allow", value_name = "SYMBOL")]
    pub allow: Vec<String>,
}

#[derive(Args)]
pub struct M4Args {
    /// Template file (must end in .m4)
    pub template: PathBuf,

    /// Extra definition, in addition to the configured ones
    #[arg(short = 'D', long = "define", value_name = "KEY=VALUE")]
    pub defines: Vec<String>,
}

#[derive(Args)]
pub struct HookArgs {
    /// Hook to run: sdk-pre-build, sdk-build, prepare, installer,
    /// data-pack, or bundle
    pub hook: String,
}

#[derive(Args)]
pub struct RunArgs {
    /// Shell commands; each runs as one job
    #[arg(required = true)]
    pub commands: Vec<String>,

    /// Number of parallel jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
