//! Post-link validation of shared libraries.
//!
//! A shared library can link clean and still carry unresolved symbols that
//! only surface when the host program dlopens it. `ldd -r` forces relocation
//! processing and reports every undefined symbol; anything outside the
//! allow-list (symbols the host is known to provide) fails the build. A
//! failing target is deleted so an incremental rebuild cannot pick up the
//! broken artifact.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::shell::{Shell, Status};

static UNDEFINED_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^undefined symbol: (.*)\t\((.*)\)").unwrap());

/// One undefined symbol reported by `ldd -r`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedSymbol {
    pub symbol: String,
    pub referenced_from: String,
}

/// Parse `ldd -r` output into its undefined-symbol reports.
///
/// Regular dependency lines (`libfoo.so => ...`) pass through unmatched.
pub fn parse_ldd_output(output: &str) -> Vec<UndefinedSymbol> {
    output
        .lines()
        .filter_map(|line| {
            UNDEFINED_SYMBOL.captures(line).map(|caps| UndefinedSymbol {
                symbol: caps[1].to_string(),
                referenced_from: caps[2].to_string(),
            })
        })
        .collect()
}

/// Post-link check for one or more shared libraries.
#[derive(Debug, Clone, Default)]
pub struct LinkCheck {
    allowed_symbols: Vec<String>,
}

impl LinkCheck {
    pub fn new(allowed_symbols: Vec<String>) -> Self {
        LinkCheck { allowed_symbols }
    }

    /// The undefined symbols not covered by the allow-list.
    pub fn violations<'a>(&self, symbols: &'a [UndefinedSymbol]) -> Vec<&'a UndefinedSymbol> {
        symbols
            .iter()
            .filter(|s| !self.allowed_symbols.iter().any(|a| *a == s.symbol))
            .collect()
    }

    /// Run `ldd -r` against a freshly linked target and fail on any
    /// undefined symbol outside the allow-list.
    ///
    /// On failure the target is deleted before the error is returned.
    pub fn validate(&self, target: &Path, shell: &Shell) -> Result<()> {
        if !target.is_file() {
            bail!("shared library `{}` not found", target.display());
        }

        let ldd = find_executable("ldd")
            .context("`ldd` not found in PATH; cannot validate shared library")?;

        shell.status(Status::Checking, target.display());
        let output = ProcessBuilder::new(ldd).arg("-r").arg(target).exec()?;

        // ldd splits its report across both streams; scan them as one, the
        // way a shell pipeline with 2>&1 would see it.
        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            let _ = std::fs::remove_file(target);
            bail!(
                "ldd returned exit code {:?} for `{}`",
                output.status.code(),
                target.display()
            );
        }

        let undefined = parse_ldd_output(&report);
        let violations = self.violations(&undefined);
        if !violations.is_empty() {
            shell.raw(report.trim_end());
            let symbols: Vec<&str> = violations.iter().map(|s| s.symbol.as_str()).collect();
            let _ = std::fs::remove_file(target);
            bail!(
                "undefined symbols in `{}`: {}",
                target.display(),
                symbols.join(", ")
            );
        }

        tracing::debug!(
            "{}: {} undefined symbols, all allowed",
            target.display(),
            undefined.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::shell::ShellMode;

    const SAMPLE: &str = "\
\tlinux-gate.so.1 =>  (0xffffe000)
\tlibc.so.6 => /lib/libc.so.6 (0xb7d9e000)
undefined symbol: idSysLocal\t(./gamex86.so)
undefined symbol: environ\t(./gamex86.so)
\t/lib/ld-linux.so.2 (0xb7f1c000)";

    #[test]
    fn test_parse_ldd_output() {
        let symbols = parse_ldd_output(SAMPLE);
        assert_eq!(symbols.len(), 2);
        assert_eq!(symbols[0].symbol, "idSysLocal");
        assert_eq!(symbols[0].referenced_from, "./gamex86.so");
        assert_eq!(symbols[1].symbol, "environ");
    }

    #[test]
    fn test_parse_ldd_output_clean() {
        let clean = "\tlibc.so.6 => /lib/libc.so.6 (0xb7d9e000)\n";
        assert!(parse_ldd_output(clean).is_empty());
    }

    #[test]
    fn test_violations_respect_allow_list() {
        let check = LinkCheck::new(vec!["environ".to_string()]);
        let symbols = parse_ldd_output(SAMPLE);
        let violations = check.violations(&symbols);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].symbol, "idSysLocal");
    }

    #[test]
    fn test_violations_empty_allow_list_flags_everything() {
        let check = LinkCheck::default();
        let symbols = parse_ldd_output(SAMPLE);
        assert_eq!(check.violations(&symbols).len(), 2);
    }

    #[test]
    fn test_validate_missing_target() {
        let check = LinkCheck::default();
        let shell = Shell::new(ShellMode::Json);
        let err = check
            .validate(Path::new("/nonexistent/libgame.so"), &shell)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
