//! Configuration file support for slipway.
//!
//! Slipway supports two configuration file locations:
//! - Global: `~/.slipway/config.toml` - User-wide defaults
//! - Project: `slipway.toml` at the project root - Project-specific overrides
//!
//! Project config takes precedence over global config. Nothing here mutates
//! ambient state; the merged `Config` is turned into a [`crate::env::BuildEnv`]
//! once at startup and passed explicitly from there on.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hooks::HookCommands;
use crate::util::shell::ColorChoice;

/// Slipway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output settings
    pub output: OutputConfig,

    /// Post-link shared-library check settings
    pub check: CheckConfig,

    /// Header version probe overrides
    pub versions: VersionsConfig,

    /// Macro definitions for m4 expansion
    pub m4: M4Config,

    /// Scripted hook commands
    pub hooks: HookCommands,
}

/// Output-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default color mode (auto, always, never)
    pub color: Option<String>,

    /// Default number of parallel jobs (None = all cores)
    pub jobs: Option<usize>,
}

/// Post-link check configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Override the platform default for running the check at all.
    ///
    /// The platform default is on everywhere except macOS, which has no ldd.
    pub enabled: Option<bool>,

    /// Undefined symbols the check tolerates.
    #[serde(default)]
    pub allowed_symbols: Vec<String>,
}

/// Version probe overrides.
///
/// Unset probes fall back to the built-in defaults in [`crate::headers`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionsConfig {
    pub engine: Option<PatternProbe>,
    pub protocol_major: Option<PatternProbe>,
    pub protocol_minor: Option<PatternProbe>,
    pub build: Option<LineProbe>,
}

/// A header probe: scan lines for a pattern, take the first capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternProbe {
    /// Header path, relative to the project root.
    pub header: PathBuf,
    /// Regex with exactly one capture group.
    pub pattern: String,
}

/// A header probe pinned to one line of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineProbe {
    /// Header path, relative to the project root.
    pub header: PathBuf,
    /// Zero-based line index to read.
    pub line: usize,
    /// Regex with exactly one capture group, applied to that line.
    pub pattern: String,
}

/// Macro expansion configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct M4Config {
    /// `--define` key/value pairs passed to every expansion.
    #[serde(default)]
    pub defines: BTreeMap<String, String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Output settings
        if other.output.color.is_some() {
            self.output.color = other.output.color;
        }
        if other.output.jobs.is_some() {
            self.output.jobs = other.output.jobs;
        }

        // Check settings
        if other.check.enabled.is_some() {
            self.check.enabled = other.check.enabled;
        }
        if !other.check.allowed_symbols.is_empty() {
            self.check.allowed_symbols = other.check.allowed_symbols;
        }

        // Version probes
        if other.versions.engine.is_some() {
            self.versions.engine = other.versions.engine;
        }
        if other.versions.protocol_major.is_some() {
            self.versions.protocol_major = other.versions.protocol_major;
        }
        if other.versions.protocol_minor.is_some() {
            self.versions.protocol_minor = other.versions.protocol_minor;
        }
        if other.versions.build.is_some() {
            self.versions.build = other.versions.build;
        }

        // Defines merge per key so a project can add to global defines
        for (key, value) in other.m4.defines {
            self.m4.defines.insert(key, value);
        }

        // Hook command lists replace wholesale
        self.hooks.merge(other.hooks);
    }

    /// Parse the configured color mode.
    pub fn color(&self) -> Option<ColorChoice> {
        self.output.color.as_ref().and_then(|s| s.parse().ok())
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (slipway.toml)
/// 2. Global config (~/.slipway/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global slipway config directory (~/.slipway).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".slipway"))
}

/// Get the global config path (~/.slipway/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (slipway.toml at the project root).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join("slipway.toml")
}
