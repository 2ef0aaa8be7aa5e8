//! Buffered command execution for parallel jobs.
//!
//! With several compile jobs running at once, line-interleaved output is
//! useless for error hunting. Each job runs with stdout and stderr fully
//! captured; once it exits, the command line and both captured streams are
//! printed as one atomic block through the shell's output lock.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use rayon::prelude::*;

use crate::util::process::ProcessBuilder;
use crate::util::shell::Shell;

/// Raw errno for ECHILD on Linux: the child was reaped before we could
/// collect it. Happens when a job's process group is torn down around us;
/// the work itself completed, so the job is treated as a success.
const ECHILD: i32 = 10;

/// Runs single commands with captured, atomically echoed output.
pub struct BufferedSpawner {
    shell: Arc<Shell>,
}

impl BufferedSpawner {
    pub fn new(shell: Arc<Shell>) -> Self {
        BufferedSpawner { shell }
    }

    /// Run one command to completion and echo its output block.
    ///
    /// The command line is echoed even when the command printed nothing, so
    /// the build log always shows what ran. A nonzero exit is an error; the
    /// captured streams have already been echoed by then.
    pub fn run(&self, builder: &ProcessBuilder) -> Result<()> {
        let command = builder.display_command();

        let output = match builder.exec() {
            Ok(output) => output,
            Err(err) if is_echild(&err) => {
                self.shell
                    .warn(format!("OSError ignored on command: {}", command));
                self.shell.job_output(&command, "", "");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        self.shell.job_output(&command, &stdout, &stderr);

        if !output.status.success() {
            bail!(
                "`{}` failed with exit code {:?}",
                command,
                output.status.code()
            );
        }
        Ok(())
    }
}

fn is_echild(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>()
        .and_then(|io| io.raw_os_error())
        == Some(ECHILD)
}

/// A batch of commands run across a thread pool.
///
/// All jobs run to completion even when one fails; the first failure in
/// submission order is returned after the batch drains, so the echoed log
/// holds every error the batch produced.
pub struct JobSet {
    shell: Arc<Shell>,
    jobs: Option<usize>,
    commands: Vec<ProcessBuilder>,
}

impl JobSet {
    /// Create an empty batch. `jobs` caps the pool size; `None` uses all cores.
    pub fn new(shell: Arc<Shell>, jobs: Option<usize>) -> Self {
        JobSet {
            shell,
            jobs,
            commands: Vec::new(),
        }
    }

    /// Queue one command.
    pub fn push(&mut self, builder: ProcessBuilder) {
        self.commands.push(builder);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run the whole batch.
    pub fn run(self) -> Result<()> {
        if self.commands.is_empty() {
            return Ok(());
        }

        // Set up rayon thread pool
        if let Some(j) = self.jobs {
            rayon::ThreadPoolBuilder::new()
                .num_threads(j)
                .build_global()
                .ok(); // Ignore if already set
        }

        tracing::info!("Running {} jobs", self.commands.len());

        let spawner = BufferedSpawner::new(Arc::clone(&self.shell));
        let progress = Mutex::new(self.shell.progress(self.commands.len() as u64, "running"));

        let results: Vec<Result<()>> = self
            .commands
            .par_iter()
            .map(|builder| {
                let result = spawner.run(builder);
                if let Ok(mut p) = progress.lock() {
                    p.inc(1);
                }
                result
            })
            .collect();

        if let Ok(p) = progress.lock() {
            p.finish();
        }

        for result in results {
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::shell::{ColorChoice, ShellMode, Verbosity};

    fn quiet_shell() -> Arc<Shell> {
        Arc::new(Shell::new(ShellMode::Human {
            verbosity: Verbosity::Quiet,
            color: ColorChoice::Never,
        }))
    }

    #[test]
    fn test_run_success() {
        let spawner = BufferedSpawner::new(quiet_shell());
        let cmd = ProcessBuilder::new("sh").args(["-c", "echo out; echo err 1>&2"]);
        assert!(spawner.run(&cmd).is_ok());
    }

    #[test]
    fn test_run_nonzero_exit_is_error() {
        let spawner = BufferedSpawner::new(quiet_shell());
        let cmd = ProcessBuilder::new("sh").args(["-c", "exit 2"]);
        let err = spawner.run(&cmd).unwrap_err();
        assert!(err.to_string().contains("exit code"));
    }

    #[test]
    fn test_is_echild_matches_reaped_child_errno() {
        let err = anyhow::Error::from(std::io::Error::from_raw_os_error(ECHILD))
            .context("failed to execute `cc -c foo.c`");
        assert!(is_echild(&err));
    }

    #[test]
    fn test_is_echild_ignores_other_errors() {
        let enoent = anyhow::Error::from(std::io::Error::from_raw_os_error(2));
        assert!(!is_echild(&enoent));
        assert!(!is_echild(&anyhow::anyhow!("not an io error")));
    }

    #[test]
    fn test_job_set_runs_all() {
        let mut jobs = JobSet::new(quiet_shell(), Some(2));
        for i in 0..4 {
            jobs.push(ProcessBuilder::new("sh").args(["-c", &format!("echo {}", i)]));
        }
        assert_eq!(jobs.len(), 4);
        assert!(jobs.run().is_ok());
    }

    #[test]
    fn test_job_set_reports_first_failure_by_order() {
        let mut jobs = JobSet::new(quiet_shell(), Some(2));
        jobs.push(ProcessBuilder::new("sh").args(["-c", "true"]));
        jobs.push(ProcessBuilder::new("sh").args(["-c", "exit 7"]));
        jobs.push(ProcessBuilder::new("sh").args(["-c", "exit 9"]));
        let err = jobs.run().unwrap_err();
        assert!(err.to_string().contains("exit code Some(7)"));
    }

    #[test]
    fn test_empty_job_set() {
        let jobs = JobSet::new(quiet_shell(), None);
        assert!(jobs.is_empty());
        assert!(jobs.run().is_ok());
    }
}
