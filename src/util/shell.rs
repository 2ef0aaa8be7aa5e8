//! Centralized shell output and progress management.
//!
//! The Shell module provides a unified API for all CLI output, including:
//! - Status messages with consistent formatting
//! - Progress bars (via indicatif)
//! - Atomic per-job output blocks for parallel command execution
//! - JSON output mode for machine-readable output
//!
//! # Design Principles
//!
//! 1. **Callers never manage spacing/indentation directly** - Shell handles all formatting
//! 2. **JSON mode is mutually exclusive** - No human output when JSON mode is enabled
//! 3. **Job output is atomic** - Command echo, stdout, and stderr of one job are
//!    written under a single lock so concurrent jobs never interleave

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use indicatif::{ProgressBar, ProgressStyle};

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors and progress bars.
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    /// Machine-readable JSON output only.
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors and captured job output only, no progress
    Quiet,
    /// Default: status messages + progress bars
    #[default]
    Normal,
    /// --verbose: immediate status lines, debug info, no progress bars
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
///
/// Shell handles all formatting - callers just specify the semantic status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Finished,
    Expanded,
    Validated,

    // In-progress statuses (cyan)
    Running,
    Checking,
    Expanding,
    Extracting,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    /// Get the display text for this status.
    fn as_str(&self) -> &'static str {
        match self {
            Status::Finished => "Finished",
            Status::Expanded => "Expanded",
            Status::Validated => "Validated",
            Status::Running => "Running",
            Status::Checking => "Checking",
            Status::Expanding => "Expanding",
            Status::Extracting => "Extracting",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    /// Get the ANSI color code for this status.
    fn color_code(&self) -> &'static str {
        match self {
            // Success: bold green
            Status::Finished | Status::Expanded | Status::Validated => "\x1b[1;32m",
            // In-progress: bold cyan
            Status::Running | Status::Checking | Status::Expanding | Status::Extracting => {
                "\x1b[1;36m"
            }
            // Warning: bold yellow
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            // Error: bold red
            Status::Error => "\x1b[1;31m",
        }
    }

    /// Get the width for alignment (12 characters).
    fn width(&self) -> usize {
        12
    }
}

/// Central shell for all CLI output.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
    /// Serializes whole-block writes from concurrent jobs.
    print_lock: Mutex<()>,
    /// Whether we've printed anything (for newline management)
    has_output: AtomicBool,
}

impl Shell {
    /// Create a new shell with the given mode.
    pub fn new(mode: ShellMode) -> Self {
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => io::stderr().is_terminal(),
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };

        Shell {
            mode,
            use_color,
            print_lock: Mutex::new(()),
            has_output: AtomicBool::new(false),
        }
    }

    /// Create a shell from CLI flags with proper precedence.
    ///
    /// JSON mode takes precedence over quiet/verbose.
    pub fn from_flags(
        quiet: bool,
        verbose: bool,
        color: ColorChoice,
        message_format_json: bool,
    ) -> Self {
        let mode = if message_format_json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    /// Check if shell is in quiet mode.
    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    /// Check if shell is in verbose mode.
    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    /// Check if shell is in JSON mode.
    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`
    ///
    /// In quiet mode, only Error status is printed.
    /// In JSON mode, messages are silently ignored (use json_event for JSON output).
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() {
            return;
        }

        if self.is_quiet() && status != Status::Error {
            return;
        }

        let prefix = self.format_status(status);
        eprintln!("{} {}", prefix, msg);
        self.has_output.store(true, Ordering::SeqCst);
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print an error message.
    ///
    /// In JSON mode, this outputs a JSON error event.
    pub fn error(&self, msg: impl Display) {
        if self.is_json() {
            let event = serde_json::json!({
                "reason": "error",
                "message": msg.to_string()
            });
            self.json_event(&event);
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// Print the captured output of one finished job as an atomic block.
    ///
    /// The command line is echoed first, then captured stdout to stdout, then
    /// captured stderr to stderr, all under a single lock so output from
    /// parallel jobs never interleaves. Empty streams are skipped; the command
    /// echo is not.
    ///
    /// In JSON mode this emits a single `job-output` event instead.
    pub fn job_output(&self, command: &str, stdout: &str, stderr: &str) {
        if self.is_json() {
            let event = serde_json::json!({
                "reason": "job-output",
                "command": command,
                "stdout": stdout,
                "stderr": stderr,
            });
            self.json_event(&event);
            return;
        }

        let _guard = self.print_lock.lock().unwrap_or_else(|e| e.into_inner());
        {
            let stdout_handle = io::stdout();
            let mut out = stdout_handle.lock();
            let _ = writeln!(out, "{}", command);
            if !stdout.is_empty() {
                let _ = write!(out, "{}", stdout);
                if !stdout.ends_with('\n') {
                    let _ = writeln!(out);
                }
            }
            let _ = out.flush();
        }
        if !stderr.is_empty() {
            let stderr_handle = io::stderr();
            let mut err = stderr_handle.lock();
            let _ = write!(err, "{}", stderr);
            if !stderr.ends_with('\n') {
                let _ = writeln!(err);
            }
            let _ = err.flush();
        }
        self.has_output.store(true, Ordering::SeqCst);
    }

    /// Print a raw line to stdout under the output lock.
    ///
    /// Used for command echo and captured tool output that must reach the
    /// user verbatim (ldd reports, m4 diagnostics). Suppressed in JSON mode.
    pub fn raw(&self, msg: impl Display) {
        if self.is_json() {
            return;
        }

        let _guard = self.print_lock.lock().unwrap_or_else(|e| e.into_inner());
        println!("{}", msg);
        let _ = io::stdout().flush();
        self.has_output.store(true, Ordering::SeqCst);
    }

    /// Print a JSON event to stdout.
    ///
    /// Only works in JSON mode; silently ignored in human mode.
    pub fn json_event(&self, event: &serde_json::Value) {
        if !self.is_json() {
            return;
        }

        let json_str = serde_json::to_string(event).unwrap_or_default();
        let _guard = self.print_lock.lock().unwrap_or_else(|e| e.into_inner());
        println!("{}", json_str);
        let _ = io::stdout().flush();
    }

    /// Format a status prefix with optional color.
    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        let width = status.width();

        if self.use_color {
            let color = status.color_code();
            format!("{}{:>width$}\x1b[0m", color, text, width = width)
        } else {
            format!("{:>width$}", text, width = width)
        }
    }

    /// Create a progress bar.
    ///
    /// In quiet or verbose mode, returns a no-op progress bar.
    /// In JSON mode, progress updates are emitted as JSON events.
    pub fn progress(self: &Arc<Self>, total: u64, msg: impl Display) -> Progress {
        Progress::new(Arc::clone(self), total, msg.to_string())
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

/// Progress bar wrapper that respects shell mode.
pub struct Progress {
    shell: Arc<Shell>,
    pb: Option<ProgressBar>,
    total: u64,
    current: u64,
    message: String,
}

impl Progress {
    /// Create a new progress bar.
    fn new(shell: Arc<Shell>, total: u64, message: String) -> Self {
        let pb = if shell.is_quiet() || shell.is_verbose() || shell.is_json() {
            None
        } else if total > 1 {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            pb.set_message(message.clone());
            Some(pb)
        } else {
            None
        };

        Progress {
            shell,
            pb,
            total,
            current: 0,
            message,
        }
    }

    /// Increment progress.
    pub fn inc(&mut self, delta: u64) {
        self.current += delta;

        if let Some(pb) = &self.pb {
            pb.inc(delta);
        }

        // In JSON mode, emit progress event
        if self.shell.is_json() {
            let event = serde_json::json!({
                "reason": "job-progress",
                "current": self.current,
                "total": self.total,
                "message": self.message
            });
            self.shell.json_event(&event);
        }
    }

    /// Finish the progress bar.
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}
