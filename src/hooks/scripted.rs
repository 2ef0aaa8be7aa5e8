//! Hooks backed by configured shell commands.

use anyhow::Result;

use crate::env::BuildEnv;
use crate::hooks::{BundleHooks, HookCommands, SdkHooks, SetupHooks};

/// Runs the `[hooks]` command lists through the shell-command wrapper.
///
/// Commands run from the project root and see the build facts as `SLIPWAY_*`
/// environment variables, so packaging scripts need no argument plumbing of
/// their own.
pub struct ScriptedHooks {
    commands: HookCommands,
}

impl ScriptedHooks {
    pub fn new(commands: HookCommands) -> Self {
        ScriptedHooks { commands }
    }

    fn environment(env: &BuildEnv) -> Vec<(String, String)> {
        let mut vars = vec![(
            "SLIPWAY_PROJECT_ROOT".to_string(),
            env.root().display().to_string(),
        )];
        if let Some(jobs) = env.jobs() {
            vars.push(("SLIPWAY_JOBS".to_string(), jobs.to_string()));
        }
        vars
    }

    fn run_all(&self, env: &BuildEnv, commands: &[String]) -> Result<()> {
        let runner = env.command_runner();
        let vars = Self::environment(env);
        for cmd in commands {
            runner.run_with_env(cmd, &vars)?;
        }
        Ok(())
    }
}

impl SdkHooks for ScriptedHooks {
    fn pre_build(&self, env: &BuildEnv) -> Result<()> {
        self.run_all(env, &self.commands.sdk_pre_build)
    }

    fn build(&self, env: &BuildEnv) -> Result<()> {
        self.run_all(env, &self.commands.sdk_build)
    }
}

impl SetupHooks for ScriptedHooks {
    fn prepare(&self, env: &BuildEnv) -> Result<()> {
        self.run_all(env, &self.commands.prepare)
    }

    fn build_installer(&self, env: &BuildEnv) -> Result<()> {
        self.run_all(env, &self.commands.installer)
    }

    fn build_data_pack(&self, env: &BuildEnv) -> Result<()> {
        self.run_all(env, &self.commands.data_pack)
    }
}

impl BundleHooks for ScriptedHooks {
    fn build_bundle(&self, env: &BuildEnv) -> Result<()> {
        self.run_all(env, &self.commands.bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::BuildEnv;
    use crate::hooks::HookKind;
    use crate::util::config::Config;
    use crate::util::shell::{ColorChoice, Shell, ShellMode, Verbosity};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn env_with_hooks(root: &std::path::Path, commands: HookCommands) -> BuildEnv {
        let mut config = Config::default();
        config.hooks = commands;
        let shell = Arc::new(Shell::new(ShellMode::Human {
            verbosity: Verbosity::Quiet,
            color: ColorChoice::Never,
        }));
        BuildEnv::from_config(root.to_path_buf(), config, shell)
    }

    #[test]
    fn test_scripted_hook_runs_commands_in_order() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("ran.txt");
        let commands = HookCommands {
            prepare: vec![
                format!("echo first > {}", marker.display()),
                format!("echo second >> {}", marker.display()),
            ],
            ..HookCommands::default()
        };

        let env = env_with_hooks(tmp.path(), commands);
        env.run_hook(HookKind::Prepare).unwrap();

        let contents = std::fs::read_to_string(&marker).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn test_scripted_hook_sees_project_root() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("root.txt");
        let commands = HookCommands {
            bundle: vec![format!("echo $SLIPWAY_PROJECT_ROOT > {}", marker.display())],
            ..HookCommands::default()
        };

        let env = env_with_hooks(tmp.path(), commands);
        env.run_hook(HookKind::BuildBundle).unwrap();

        let contents = std::fs::read_to_string(&marker).unwrap();
        assert_eq!(contents.trim(), tmp.path().display().to_string());
    }

    #[test]
    fn test_scripted_hook_failure_stops_the_sequence() {
        let tmp = TempDir::new().unwrap();
        let marker = tmp.path().join("never.txt");
        let commands = HookCommands {
            sdk_build: vec![
                "exit 3".to_string(),
                format!("echo reached > {}", marker.display()),
            ],
            ..HookCommands::default()
        };

        let env = env_with_hooks(tmp.path(), commands);
        assert!(env.run_hook(HookKind::SdkBuild).is_err());
        assert!(!marker.exists());
    }

    #[test]
    fn test_unconfigured_sibling_hook_is_noop() {
        // Configuring sdk_build selects ScriptedHooks for the whole SDK
        // capability; the unconfigured pre-build step runs zero commands.
        let tmp = TempDir::new().unwrap();
        let commands = HookCommands {
            sdk_build: vec!["true".to_string()],
            ..HookCommands::default()
        };

        let env = env_with_hooks(tmp.path(), commands);
        assert!(env.run_hook(HookKind::SdkPreBuild).is_ok());
    }

    #[test]
    fn test_unconfigured_capability_fails_loud() {
        let tmp = TempDir::new().unwrap();
        let env = env_with_hooks(tmp.path(), HookCommands::default());
        let err = env.run_hook(HookKind::BuildInstaller).unwrap_err();
        assert!(err.to_string().contains("not implemented"));
    }
}
