//! Shell command wrappers with echoed output.
//!
//! Setup and packaging steps are shell one-liners (tar, cp, chmod over
//! globs). These wrappers run a command line through `sh -c` with stdout and
//! stderr merged, echo the command and whatever it printed, and either fail
//! loud on a nonzero exit ([`CommandRunner::run`]) or shrug it off
//! ([`CommandRunner::try_run`]).

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::util::process::ProcessBuilder;
use crate::util::shell::Shell;

/// Runs shell command lines with echoed, merged output.
pub struct CommandRunner {
    shell: Arc<Shell>,
    cwd: Option<PathBuf>,
}

impl CommandRunner {
    pub fn new(shell: Arc<Shell>) -> Self {
        CommandRunner { shell, cwd: None }
    }

    /// Run every command from this directory.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Run a command line and require success.
    ///
    /// Returns the captured output (stdout and stderr merged, one trailing
    /// newline stripped).
    pub fn run(&self, cmd: &str) -> Result<String> {
        self.run_with_env(cmd, &[])
    }

    /// [`CommandRunner::run`] with extra environment variables set for the
    /// command.
    pub fn run_with_env(&self, cmd: &str, env: &[(String, String)]) -> Result<String> {
        let (status, output) = self.capture(cmd, env)?;
        if !status.success() {
            bail!("`{}` failed with exit code {:?}", cmd, status.code());
        }
        Ok(output)
    }

    /// Run a command line, ignoring its exit status.
    ///
    /// Failing to start `sh` at all is still an error.
    pub fn try_run(&self, cmd: &str) -> Result<String> {
        let (_, output) = self.capture(cmd, &[])?;
        Ok(output)
    }

    fn capture(&self, cmd: &str, env: &[(String, String)]) -> Result<(ExitStatus, String)> {
        self.shell.raw(cmd);

        // The brace group redirects stderr into stdout for compound command
        // lines, pipes included.
        let wrapped = format!("{{ {}; }} 2>&1", cmd);
        let mut builder = ProcessBuilder::new("sh").args(["-c", &wrapped]);
        for (key, value) in env {
            builder = builder.env(key, value);
        }
        if let Some(dir) = &self.cwd {
            builder = builder.cwd(dir);
        }
        let output = builder.exec()?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        if text.ends_with('\n') {
            text.pop();
        }
        if !text.is_empty() {
            self.shell.raw(&text);
        }

        Ok((output.status, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::shell::{ColorChoice, ShellMode, Verbosity};

    fn runner() -> CommandRunner {
        CommandRunner::new(Arc::new(Shell::new(ShellMode::Human {
            verbosity: Verbosity::Quiet,
            color: ColorChoice::Never,
        })))
    }

    #[test]
    fn test_run_returns_output() {
        let output = runner().run("echo hello").unwrap();
        assert_eq!(output, "hello");
    }

    #[test]
    fn test_run_merges_stderr() {
        let output = runner().run("echo out; echo err 1>&2").unwrap();
        assert_eq!(output, "out\nerr");
    }

    #[test]
    fn test_run_fails_on_nonzero_exit() {
        let err = runner().run("exit 4").unwrap_err();
        assert!(err.to_string().contains("exit code Some(4)"));
    }

    #[test]
    fn test_try_run_ignores_exit_status() {
        let output = runner().try_run("echo partial; exit 1").unwrap();
        assert_eq!(output, "partial");
    }

    #[test]
    fn test_run_with_env() {
        let env = vec![("SLIPWAY_TEST_VALUE".to_string(), "marker".to_string())];
        let output = runner()
            .run_with_env("echo $SLIPWAY_TEST_VALUE", &env)
            .unwrap();
        assert_eq!(output, "marker");
    }

    #[test]
    fn test_run_in_directory() {
        let tmp = tempfile::TempDir::new().unwrap();
        runner().cwd(tmp.path()).run("touch here").unwrap();
        assert!(tmp.path().join("here").exists());
    }
}
