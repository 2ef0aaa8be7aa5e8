//! The explicit build environment.
//!
//! One `BuildEnv` is constructed at startup from the merged configuration
//! and passed to every operation that needs build facts. There is no ambient
//! mutable environment: what a step can see is exactly what the env carries,
//! and the optional capabilities behind [`crate::hooks::HookSet`] are chosen
//! here, once, rather than discovered mid-build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::exec::{CommandRunner, JobSet};
use crate::headers::{self, VersionProbes};
use crate::hooks::{HookKind, HookSet};
use crate::linker::LinkCheck;
use crate::m4::M4Expander;
use crate::util::config::Config;
use crate::util::shell::{Shell, Status};

/// Build facts and services for one invocation.
#[derive(Debug)]
pub struct BuildEnv {
    root: PathBuf,
    shell: Arc<Shell>,
    jobs: Option<usize>,
    check_shared_libs: bool,
    allowed_symbols: Vec<String>,
    probes: VersionProbes,
    m4_defines: BTreeMap<String, String>,
    hooks: HookSet,
}

impl BuildEnv {
    /// Build the environment from merged configuration.
    pub fn from_config(root: PathBuf, config: Config, shell: Arc<Shell>) -> Self {
        // macOS has no ldd; everywhere else the check defaults on.
        let check_shared_libs = config
            .check
            .enabled
            .unwrap_or(cfg!(not(target_os = "macos")));

        BuildEnv {
            root,
            shell,
            jobs: config.output.jobs,
            check_shared_libs,
            allowed_symbols: config.check.allowed_symbols,
            probes: VersionProbes::from_config(&config.versions),
            m4_defines: config.m4.defines,
            hooks: HookSet::from_commands(&config.hooks),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    pub fn shell_arc(&self) -> Arc<Shell> {
        Arc::clone(&self.shell)
    }

    pub fn jobs(&self) -> Option<usize> {
        self.jobs
    }

    /// Whether freshly linked shared libraries get the `ldd -r` check.
    pub fn check_shared_libs(&self) -> bool {
        self.check_shared_libs
    }

    /// Undefined symbols tolerated by the shared library check.
    pub fn allowed_symbols(&self) -> &[String] {
        &self.allowed_symbols
    }

    /// Validate a freshly linked shared library, honoring the platform gate.
    ///
    /// When the check is off this is a no-op; the target is not even
    /// required to exist, since no later step depends on the validation.
    pub fn validate_shared_library(&self, target: &Path) -> Result<()> {
        if !self.check_shared_libs {
            self.shell.status(
                Status::Skipped,
                format!("shared library check for {}", target.display()),
            );
            return Ok(());
        }
        LinkCheck::new(self.allowed_symbols.clone()).validate(target, &self.shell)
    }

    /// Engine version from the configured probe.
    pub fn engine_version(&self) -> Result<String> {
        headers::engine_version(&self.root, &self.probes)
    }

    /// Network protocol version as `major.minor`.
    pub fn protocol_version(&self) -> Result<String> {
        headers::protocol_version(&self.root, &self.probes)
    }

    /// Build counter from the generated build header.
    pub fn build_version(&self) -> Result<String> {
        headers::build_version(&self.root, &self.probes)
    }

    /// Template expander carrying the configured defines.
    pub fn m4_expander(&self) -> M4Expander {
        M4Expander::new(self.m4_defines.clone())
    }

    /// Expand one `.m4` template next to its input.
    pub fn expand_m4(&self, input: &Path) -> Result<PathBuf> {
        self.m4_expander().expand(input, &self.shell)
    }

    /// Shell-command wrapper bound to this env's output, running from the
    /// project root.
    pub fn command_runner(&self) -> CommandRunner {
        CommandRunner::new(self.shell_arc()).cwd(&self.root)
    }

    /// Empty parallel batch bound to this env's output and job cap.
    pub fn job_set(&self) -> JobSet {
        JobSet::new(self.shell_arc(), self.jobs)
    }

    /// Run one optional capability hook.
    pub fn run_hook(&self, kind: HookKind) -> Result<()> {
        match kind {
            HookKind::SdkPreBuild => self.hooks.sdk.pre_build(self),
            HookKind::SdkBuild => self.hooks.sdk.build(self),
            HookKind::Prepare => self.hooks.setup.prepare(self),
            HookKind::BuildInstaller => self.hooks.setup.build_installer(self),
            HookKind::BuildDataPack => self.hooks.setup.build_data_pack(self),
            HookKind::BuildBundle => self.hooks.bundle.build_bundle(self),
        }
    }
}
