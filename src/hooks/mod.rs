//! Optional build capabilities: SDK packaging, installer builds, app bundles.
//!
//! Not every checkout can run every step - the public source drop has no SDK
//! packaging, Linux trees build no app bundle. Each optional capability is a
//! trait with a fail-loud default implementation; which implementation backs
//! each trait is decided once, from configuration, when the
//! [`crate::env::BuildEnv`] is constructed. Nothing is wired by probing the
//! filesystem at call time.

mod scripted;

pub use scripted::ScriptedHooks;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::env::BuildEnv;

/// SDK packaging steps.
pub trait SdkHooks: Send + Sync {
    /// Stage headers and stubs before the main build.
    fn pre_build(&self, env: &BuildEnv) -> Result<()>;
    /// Package the SDK after the build.
    fn build(&self, env: &BuildEnv) -> Result<()>;
}

/// Installer and data packaging steps.
pub trait SetupHooks: Send + Sync {
    /// Stage the files an installer build needs.
    fn prepare(&self, env: &BuildEnv) -> Result<()>;
    /// Build the installer image.
    fn build_installer(&self, env: &BuildEnv) -> Result<()>;
    /// Build the game data pack.
    fn build_data_pack(&self, env: &BuildEnv) -> Result<()>;
}

/// Application bundle assembly.
pub trait BundleHooks: Send + Sync {
    fn build_bundle(&self, env: &BuildEnv) -> Result<()>;
}

/// Identifies one hook across the CLI and the [`HookSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    SdkPreBuild,
    SdkBuild,
    Prepare,
    BuildInstaller,
    BuildDataPack,
    BuildBundle,
}

impl HookKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::SdkPreBuild => "sdk-pre-build",
            HookKind::SdkBuild => "sdk-build",
            HookKind::Prepare => "prepare",
            HookKind::BuildInstaller => "installer",
            HookKind::BuildDataPack => "data-pack",
            HookKind::BuildBundle => "bundle",
        }
    }

    pub fn all() -> &'static [HookKind] {
        &[
            HookKind::SdkPreBuild,
            HookKind::SdkBuild,
            HookKind::Prepare,
            HookKind::BuildInstaller,
            HookKind::BuildDataPack,
            HookKind::BuildBundle,
        ]
    }
}

impl std::str::FromStr for HookKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sdk-pre-build" => Ok(HookKind::SdkPreBuild),
            "sdk-build" => Ok(HookKind::SdkBuild),
            "prepare" => Ok(HookKind::Prepare),
            "installer" => Ok(HookKind::BuildInstaller),
            "data-pack" => Ok(HookKind::BuildDataPack),
            "bundle" => Ok(HookKind::BuildBundle),
            _ => Err(format!(
                "unknown hook '{}'; expected one of {}",
                s,
                HookKind::all()
                    .iter()
                    .map(|k| k.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Configured command lines per hook (the `[hooks]` config section).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookCommands {
    pub sdk_pre_build: Vec<String>,
    pub sdk_build: Vec<String>,
    pub prepare: Vec<String>,
    pub installer: Vec<String>,
    pub data_pack: Vec<String>,
    pub bundle: Vec<String>,
}

impl HookCommands {
    /// Merge another set into this one; non-empty lists replace wholesale.
    pub fn merge(&mut self, other: HookCommands) {
        if !other.sdk_pre_build.is_empty() {
            self.sdk_pre_build = other.sdk_pre_build;
        }
        if !other.sdk_build.is_empty() {
            self.sdk_build = other.sdk_build;
        }
        if !other.prepare.is_empty() {
            self.prepare = other.prepare;
        }
        if !other.installer.is_empty() {
            self.installer = other.installer;
        }
        if !other.data_pack.is_empty() {
            self.data_pack = other.data_pack;
        }
        if !other.bundle.is_empty() {
            self.bundle = other.bundle;
        }
    }

    fn configures_sdk(&self) -> bool {
        !self.sdk_pre_build.is_empty() || !self.sdk_build.is_empty()
    }

    fn configures_setup(&self) -> bool {
        !self.prepare.is_empty() || !self.installer.is_empty() || !self.data_pack.is_empty()
    }

    fn configures_bundle(&self) -> bool {
        !self.bundle.is_empty()
    }
}

/// The selected implementation behind each capability trait.
pub struct HookSet {
    pub sdk: Box<dyn SdkHooks>,
    pub setup: Box<dyn SetupHooks>,
    pub bundle: Box<dyn BundleHooks>,
}

impl HookSet {
    /// Select implementations from configured commands.
    ///
    /// A capability with any command list configured gets [`ScriptedHooks`];
    /// the rest stay [`Unimplemented`]. The selection is per capability, not
    /// per method: configuring `sdk_build` alone makes `sdk_pre_build` a
    /// no-op rather than an error, matching a packaging script that only
    /// needs the one step.
    pub fn from_commands(commands: &HookCommands) -> Self {
        let mut set = HookSet::default();
        if commands.configures_sdk() {
            set.sdk = Box::new(ScriptedHooks::new(commands.clone()));
        }
        if commands.configures_setup() {
            set.setup = Box::new(ScriptedHooks::new(commands.clone()));
        }
        if commands.configures_bundle() {
            set.bundle = Box::new(ScriptedHooks::new(commands.clone()));
        }
        set
    }
}

impl Default for HookSet {
    fn default() -> Self {
        HookSet {
            sdk: Box::new(Unimplemented),
            setup: Box::new(Unimplemented),
            bundle: Box::new(Unimplemented),
        }
    }
}

impl std::fmt::Debug for HookSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSet").finish_non_exhaustive()
    }
}

/// Fail-loud default for every capability.
///
/// Invoking any hook through this implementation is an error; a checkout
/// without the packaging scripts should fail a packaging run, not quietly
/// skip it.
pub struct Unimplemented;

impl Unimplemented {
    fn refuse(hook: HookKind) -> Result<()> {
        bail!(
            "hook `{}` is not implemented; configure [hooks] commands for it",
            hook.as_str()
        )
    }
}

impl SdkHooks for Unimplemented {
    fn pre_build(&self, _env: &BuildEnv) -> Result<()> {
        Self::refuse(HookKind::SdkPreBuild)
    }

    fn build(&self, _env: &BuildEnv) -> Result<()> {
        Self::refuse(HookKind::SdkBuild)
    }
}

impl SetupHooks for Unimplemented {
    fn prepare(&self, _env: &BuildEnv) -> Result<()> {
        Self::refuse(HookKind::Prepare)
    }

    fn build_installer(&self, _env: &BuildEnv) -> Result<()> {
        Self::refuse(HookKind::BuildInstaller)
    }

    fn build_data_pack(&self, _env: &BuildEnv) -> Result<()> {
        Self::refuse(HookKind::BuildDataPack)
    }
}

impl BundleHooks for Unimplemented {
    fn build_bundle(&self, _env: &BuildEnv) -> Result<()> {
        Self::refuse(HookKind::BuildBundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_kind_round_trip() {
        for kind in HookKind::all() {
            assert_eq!(kind.as_str().parse::<HookKind>().unwrap(), *kind);
        }
        assert!("no-such-hook".parse::<HookKind>().is_err());
    }

    #[test]
    fn test_hook_commands_merge_replaces_wholesale() {
        let mut base = HookCommands {
            sdk_build: vec!["tar cf sdk.tar include".to_string()],
            prepare: vec!["mkdir -p stage".to_string()],
            ..HookCommands::default()
        };
        let other = HookCommands {
            sdk_build: vec!["./package-sdk.sh".to_string()],
            ..HookCommands::default()
        };
        base.merge(other);
        assert_eq!(base.sdk_build, vec!["./package-sdk.sh"]);
        assert_eq!(base.prepare, vec!["mkdir -p stage"]);
    }

    #[test]
    fn test_hook_commands_toml_shape() {
        let commands: HookCommands = toml::from_str(
            r#"
sdk_build = ["./package-sdk.sh"]
bundle = ["sh sys/osx/make_bundle.sh"]
"#,
        )
        .unwrap();
        assert!(commands.configures_sdk());
        assert!(commands.configures_bundle());
        assert!(!commands.configures_setup());
    }
}
