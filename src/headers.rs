//! Version-string extraction from engine headers.
//!
//! Release scripts need the engine, network protocol, and build counter
//! versions, and the only authoritative place those live is a handful of
//! C++ headers. Each probe is a line regex with one capture group; the first
//! matching line wins. Which headers and which patterns are config data on
//! [`crate::env::BuildEnv`], with defaults matching the stock engine layout.

use std::path::Path;

use anyhow::{bail, Context, Result};
use regex::Regex;

use crate::util::config::{LineProbe, PatternProbe, VersionsConfig};

/// Placeholder used when a probe scans its header without a match.
///
/// Version strings end up in installer file names; a visible placeholder
/// beats aborting a packaging run over a reshuffled header.
const UNKNOWN: &str = "X";

/// The resolved set of version probes for one project.
#[derive(Debug, Clone)]
pub struct VersionProbes {
    pub engine: PatternProbe,
    pub protocol_major: PatternProbe,
    pub protocol_minor: PatternProbe,
    pub build: LineProbe,
}

impl Default for VersionProbes {
    fn default() -> Self {
        VersionProbes {
            engine: PatternProbe {
                header: "framework/Licensee.h".into(),
                pattern: r#"^#define.*ENGINE_VERSION\t*"DOOM (.*)""#.to_string(),
            },
            protocol_major: PatternProbe {
                header: "framework/Licensee.h".into(),
                pattern: r"^#define ASYNC_PROTOCOL_MAJOR\t*(.*)".to_string(),
            },
            protocol_minor: PatternProbe {
                header: "framework/async/AsyncNetwork.h".into(),
                pattern: r"^const int ASYNC_PROTOCOL_MINOR\t*= (.*);".to_string(),
            },
            build: LineProbe {
                header: "framework/BuildVersion.h".into(),
                line: 4,
                pattern: r".* = (.*);".to_string(),
            },
        }
    }
}

impl VersionProbes {
    /// Apply config overrides on top of the defaults.
    pub fn from_config(config: &VersionsConfig) -> Self {
        let mut probes = VersionProbes::default();
        if let Some(engine) = &config.engine {
            probes.engine = engine.clone();
        }
        if let Some(major) = &config.protocol_major {
            probes.protocol_major = major.clone();
        }
        if let Some(minor) = &config.protocol_minor {
            probes.protocol_minor = minor.clone();
        }
        if let Some(build) = &config.build {
            probes.build = build.clone();
        }
        probes
    }
}

/// Scan a header line by line, returning the first capture of `pattern`.
///
/// A missing or unreadable header is an error; a header with no matching
/// line is `None`.
pub fn scan_header(path: &Path, pattern: &Regex) -> Result<Option<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read header `{}`", path.display()))?;

    for line in text.lines() {
        if let Some(caps) = pattern.captures(line) {
            if let Some(m) = caps.get(1) {
                return Ok(Some(m.as_str().to_string()));
            }
        }
    }
    Ok(None)
}

fn run_probe(root: &Path, probe: &PatternProbe) -> Result<String> {
    let pattern = Regex::new(&probe.pattern)
        .with_context(|| format!("invalid version probe pattern `{}`", probe.pattern))?;
    let value = scan_header(&root.join(&probe.header), &pattern)?;
    Ok(value.unwrap_or_else(|| UNKNOWN.to_string()))
}

/// Extract the engine version string, e.g. `1.3.1`.
pub fn engine_version(root: &Path, probes: &VersionProbes) -> Result<String> {
    run_probe(root, &probes.engine)
}

/// Extract the network protocol version as `major.minor`.
///
/// The two components live in different headers and fall back to the
/// placeholder independently, so a half-known protocol reads e.g. `1.X`.
pub fn protocol_version(root: &Path, probes: &VersionProbes) -> Result<String> {
    let major = run_probe(root, &probes.protocol_major)?;
    let minor = run_probe(root, &probes.protocol_minor)?;
    Ok(format!("{}.{}", major, minor))
}

/// Extract the build counter from its pinned header line.
///
/// The build header is machine-generated with a fixed shape, so unlike the
/// scanning probes this one fails loud: a missing line or a line the pattern
/// does not match means the generator changed and the caller must know.
pub fn build_version(root: &Path, probes: &VersionProbes) -> Result<String> {
    let probe = &probes.build;
    let path = root.join(&probe.header);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read header `{}`", path.display()))?;

    let line = match text.lines().nth(probe.line) {
        Some(line) => line,
        None => bail!(
            "header `{}` has no line {}",
            path.display(),
            probe.line
        ),
    };

    let pattern = Regex::new(&probe.pattern)
        .with_context(|| format!("invalid version probe pattern `{}`", probe.pattern))?;
    match pattern.captures(line).and_then(|caps| caps.get(1)) {
        Some(m) => Ok(m.as_str().to_string()),
        None => bail!(
            "line {} of `{}` does not match `{}`",
            probe.line,
            path.display(),
            probe.pattern
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_header(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn stock_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_header(
            tmp.path(),
            "framework/Licensee.h",
            "// license text\n#define ENGINE_VERSION\t\"DOOM 1.3.1\"\n#define ASYNC_PROTOCOL_MAJOR\t1\n",
        );
        write_header(
            tmp.path(),
            "framework/async/AsyncNetwork.h",
            "const int ASYNC_PROTOCOL_MINOR\t= 41;\n",
        );
        write_header(
            tmp.path(),
            "framework/BuildVersion.h",
            "// generated, do not edit\n//\n\nstatic const int\nBUILD_NUMBER = 1304;\n",
        );
        tmp
    }

    #[test]
    fn test_engine_version() {
        let tmp = stock_tree();
        let probes = VersionProbes::default();
        assert_eq!(engine_version(tmp.path(), &probes).unwrap(), "1.3.1");
    }

    #[test]
    fn test_engine_version_placeholder_when_pattern_absent() {
        let tmp = TempDir::new().unwrap();
        write_header(tmp.path(), "framework/Licensee.h", "// nothing here\n");
        let probes = VersionProbes::default();
        assert_eq!(engine_version(tmp.path(), &probes).unwrap(), "X");
    }

    #[test]
    fn test_engine_version_missing_header_is_error() {
        let tmp = TempDir::new().unwrap();
        let probes = VersionProbes::default();
        assert!(engine_version(tmp.path(), &probes).is_err());
    }

    #[test]
    fn test_protocol_version() {
        let tmp = stock_tree();
        let probes = VersionProbes::default();
        assert_eq!(protocol_version(tmp.path(), &probes).unwrap(), "1.41");
    }

    #[test]
    fn test_protocol_components_fall_back_independently() {
        let tmp = stock_tree();
        write_header(
            tmp.path(),
            "framework/async/AsyncNetwork.h",
            "// minor moved elsewhere\n",
        );
        let probes = VersionProbes::default();
        assert_eq!(protocol_version(tmp.path(), &probes).unwrap(), "1.X");
    }

    #[test]
    fn test_build_version() {
        let tmp = stock_tree();
        let probes = VersionProbes::default();
        assert_eq!(build_version(tmp.path(), &probes).unwrap(), "1304");
    }

    #[test]
    fn test_build_version_short_file_is_error() {
        let tmp = TempDir::new().unwrap();
        write_header(tmp.path(), "framework/BuildVersion.h", "one line\n");
        let probes = VersionProbes::default();
        let err = build_version(tmp.path(), &probes).unwrap_err();
        assert!(err.to_string().contains("has no line 4"));
    }

    #[test]
    fn test_build_version_unmatched_line_is_error() {
        let tmp = TempDir::new().unwrap();
        write_header(
            tmp.path(),
            "framework/BuildVersion.h",
            "a\nb\nc\nd\nno version here\n",
        );
        let probes = VersionProbes::default();
        assert!(build_version(tmp.path(), &probes).is_err());
    }

    #[test]
    fn test_probe_overrides_from_config() {
        let mut config = VersionsConfig::default();
        config.engine = Some(PatternProbe {
            header: "version.h".into(),
            pattern: r#"^#define VERSION "(.*)""#.to_string(),
        });

        let probes = VersionProbes::from_config(&config);
        assert_eq!(probes.engine.header, std::path::PathBuf::from("version.h"));
        // Untouched probes keep their defaults
        assert_eq!(
            probes.protocol_minor.header,
            std::path::PathBuf::from("framework/async/AsyncNetwork.h")
        );

        let tmp = TempDir::new().unwrap();
        write_header(tmp.path(), "version.h", "#define VERSION \"2.0\"\n");
        assert_eq!(engine_version(tmp.path(), &probes).unwrap(), "2.0");
    }
}
