//! Project-local configuration file.
//!
//! An optional `uabuild.toml` at the source root overrides the artifact URL
//! (mirrors and firewalled environments), the toolchain program, and the
//! default build/output roots. A missing file means defaults; a malformed
//! one is a hard failure to prevent silently ignoring user intent.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file name looked up under the source root.
pub const CONFIG_FILE_NAME: &str = "uabuild.toml";

/// Optional overrides read from `uabuild.toml`.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Replaces the resolved artifact's download URL.
    pub artifact_url: Option<String>,
    /// Toolchain program to invoke instead of `cmake`.
    pub toolchain_program: Option<String>,
    /// Build root, relative to the source root unless absolute.
    pub build_root: Option<PathBuf>,
    /// Package output root, relative to the source root unless absolute.
    pub output_root: Option<PathBuf>,
}

impl ProjectConfig {
    /// Loads the config for a source root. Returns defaults if the file
    /// does not exist.
    pub fn load(source_root: &Path) -> Result<Self> {
        Self::load_from(&source_root.join(CONFIG_FILE_NAME))
    }

    /// Loads config from a specific path. Returns defaults if the file does
    /// not exist; parse errors and other I/O errors are surfaced.
    fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents)
                .with_context(|| format!("failed to parse config file at {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read config file at {}", path.display()))
            }
        }
    }

    /// Toolchain program after applying the override.
    pub fn toolchain_program(&self) -> &str {
        self.toolchain_program
            .as_deref()
            .unwrap_or(crate::toolchain::DEFAULT_TOOLCHAIN_PROGRAM)
    }

    /// Build root after applying the override, anchored at the source root.
    pub fn build_root(&self, source_root: &Path) -> PathBuf {
        anchor(source_root, self.build_root.as_deref(), "build")
    }

    /// Output root after applying the override, anchored at the source root.
    pub fn output_root(&self, source_root: &Path) -> PathBuf {
        anchor(source_root, self.output_root.as_deref(), "package")
    }
}

fn anchor(source_root: &Path, configured: Option<&Path>, default: &str) -> PathBuf {
    match configured {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => source_root.join(p),
        None => source_root.join(default),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
