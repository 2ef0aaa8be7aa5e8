//! Slipway - build-orchestration helpers for C/C++ projects
//!
//! This crate provides the pieces an engine build wires together: source
//! list extraction from Visual Studio project files, buffered output for
//! parallel jobs, version probes over C++ headers, m4 template expansion,
//! post-link validation of shared libraries, and configurable packaging
//! hooks. Everything operates through an explicit [`env::BuildEnv`] built
//! once from configuration at startup.

pub mod env;
pub mod exec;
pub mod headers;
pub mod hooks;
pub mod linker;
pub mod m4;
pub mod project;
pub mod util;

pub use env::BuildEnv;
pub use exec::{BufferedSpawner, CommandRunner, JobSet};
pub use linker::LinkCheck;
pub use m4::M4Expander;
pub use project::{build_list, extract_sources, extract_sources_str, ProjectFileError, SourceList};
pub use util::config::Config;
pub use util::shell::Shell;
