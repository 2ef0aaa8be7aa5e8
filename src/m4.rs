//! Macro-processed file generation.
//!
//! Installer descriptions and launcher scripts are kept as `.m4` templates;
//! expansion substitutes the per-build values (version strings, install
//! paths) and writes the result next to the template with the `.m4`
//! extension stripped. m4 is run directly with captured output rather than
//! through a shell redirect, so a failed expansion leaves no output file
//! behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::util::process::{find_executable, ProcessBuilder};
use crate::util::shell::{Shell, Status};

/// Expands `.m4` templates with a fixed set of definitions.
///
/// Defines are kept sorted so the generated command line is deterministic.
#[derive(Debug, Clone, Default)]
pub struct M4Expander {
    defines: BTreeMap<String, String>,
}

impl M4Expander {
    pub fn new(defines: BTreeMap<String, String>) -> Self {
        M4Expander { defines }
    }

    /// Add one definition.
    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.insert(key.into(), value.into());
        self
    }

    /// The output path for a template: the input with `.m4` stripped.
    pub fn output_path(input: &Path) -> Result<PathBuf> {
        if input.extension().and_then(|e| e.to_str()) != Some("m4") {
            bail!(
                "`{}` is not an .m4 template; refusing to guess an output name",
                input.display()
            );
        }
        Ok(input.with_extension(""))
    }

    /// Expand one template and write the result next to it.
    ///
    /// Returns the path of the generated file.
    pub fn expand(&self, input: &Path, shell: &Shell) -> Result<PathBuf> {
        let output_path = Self::output_path(input)?;

        let m4 = find_executable("m4").context("`m4` not found in PATH; cannot expand")?;

        let mut builder = ProcessBuilder::new(m4);
        for (key, value) in &self.defines {
            builder = builder.arg(format!("--define={}={}", key, value));
        }
        builder = builder.arg(input);

        shell.status(
            Status::Expanding,
            format!("{} -> {}", input.display(), output_path.display()),
        );
        tracing::debug!("{}", builder.display_command());

        let output = builder.exec_and_check()?;
        std::fs::write(&output_path, &output.stdout)
            .with_context(|| format!("failed to write `{}`", output_path.display()))?;

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::shell::ShellMode;
    use tempfile::TempDir;

    #[test]
    fn test_output_path_strips_m4() {
        assert_eq!(
            M4Expander::output_path(Path::new("sys/linux/setup.sh.m4")).unwrap(),
            PathBuf::from("sys/linux/setup.sh")
        );
    }

    #[test]
    fn test_output_path_rejects_other_extensions() {
        assert!(M4Expander::output_path(Path::new("setup.sh")).is_err());
        assert!(M4Expander::output_path(Path::new("archive.m4.bak")).is_err());
    }

    #[test]
    fn test_expand_substitutes_defines() {
        if find_executable("m4").is_none() {
            return;
        }

        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("launcher.sh.m4");
        std::fs::write(&input, "exec ./ENGINE_BIN +set version VERSION\n").unwrap();

        let expander = M4Expander::default()
            .define("ENGINE_BIN", "doom.x86")
            .define("VERSION", "1.3.1");
        let shell = Shell::new(ShellMode::Json);

        let out = expander.expand(&input, &shell).unwrap();
        assert_eq!(out, tmp.path().join("launcher.sh"));
        let generated = std::fs::read_to_string(out).unwrap();
        assert_eq!(generated, "exec ./doom.x86 +set version 1.3.1\n");
    }

    #[test]
    fn test_expand_missing_input_leaves_no_output() {
        if find_executable("m4").is_none() {
            return;
        }

        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("absent.m4");

        let expander = M4Expander::default();
        let shell = Shell::new(ShellMode::Json);
        assert!(expander.expand(&input, &shell).is_err());
        assert!(!tmp.path().join("absent").exists());
    }
}
