//! Host platform identification.
//!
//! OS family and architecture come from the compile-time target triple
//! (re-exported by build.rs as `env!("TARGET")`); on Linux the distro name
//! and version are read from `/etc/os-release` at runtime. Detection is
//! read-only — nothing here touches the network or writes to disk.

use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::PlatformError;

/// Standard location of the freedesktop os-release file.
const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Returns the compile-time target triple (e.g., "x86_64-unknown-linux-gnu").
pub fn build_target() -> &'static str {
    env!("TARGET")
}

/// Supported operating-system families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Linux,
}

/// The canonical platform key used to select a prebuilt SDK artifact.
///
/// Computed once per run and passed by reference downstream. The distro
/// fields are only ever populated for Linux; the constructors enforce that
/// invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformTuple {
    pub os_family: OsFamily,
    /// Linux distro id from os-release (e.g. "ubuntu"), absent when unknown.
    pub distro: Option<String>,
    /// Linux distro version from os-release (e.g. "20.04"), absent when unknown.
    pub distro_version: Option<String>,
    /// CPU architecture segment of the target triple (e.g. "x86_64").
    pub arch: String,
}

impl PlatformTuple {
    /// A Windows tuple. Distro fields are never populated on Windows.
    pub fn windows(arch: &str) -> Self {
        Self {
            os_family: OsFamily::Windows,
            distro: None,
            distro_version: None,
            arch: arch.to_string(),
        }
    }

    /// A Linux tuple with whatever distro metadata was obtainable.
    pub fn linux(arch: &str, distro: Option<&str>, distro_version: Option<&str>) -> Self {
        Self {
            os_family: OsFamily::Linux,
            distro: distro.map(str::to_string),
            distro_version: distro_version.map(str::to_string),
            arch: arch.to_string(),
        }
    }
}

impl fmt::Display for PlatformTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.os_family {
            OsFamily::Windows => write!(f, "windows ({})", self.arch),
            OsFamily::Linux => write!(
                f,
                "linux/{}/{} ({})",
                self.distro.as_deref().unwrap_or("unknown"),
                self.distro_version.as_deref().unwrap_or("unknown"),
                self.arch
            ),
        }
    }
}

/// Identifies the running platform.
///
/// Fails only when the OS family cannot be classified at all; a Linux host
/// with an unreadable or unparseable os-release file still identifies as
/// Linux with absent distro metadata.
pub fn identify() -> Result<PlatformTuple, PlatformError> {
    identify_from(build_target(), Path::new(OS_RELEASE_PATH))
}

/// Inner implementation with an injectable triple and os-release path, used
/// by tests to exercise every branch regardless of the build host.
pub fn identify_from(triple: &str, os_release: &Path) -> Result<PlatformTuple, PlatformError> {
    let arch = triple.split('-').next().unwrap_or(triple);

    if triple.contains("windows") {
        Ok(PlatformTuple::windows(arch))
    } else if triple.contains("linux") {
        let (distro, version) = read_os_release(os_release);
        Ok(PlatformTuple::linux(
            arch,
            distro.as_deref(),
            version.as_deref(),
        ))
    } else {
        Err(PlatformError {
            triple: triple.to_string(),
        })
    }
}

/// Reads distro id and version from an os-release file.
///
/// An unreadable file is not an error — distro metadata is best-effort and
/// the resolver has a generic Linux branch for the absent case.
fn read_os_release(path: &Path) -> (Option<String>, Option<String>) {
    match fs::read_to_string(path) {
        Ok(contents) => parse_os_release(&contents),
        Err(_) => (None, None),
    }
}

/// Parses `ID=` and `VERSION_ID=` lines from os-release content.
///
/// Values may be bare (`ID=debian`) or quoted (`VERSION_ID="20.04"`), per
/// the os-release format. Unrelated lines are skipped.
fn parse_os_release(contents: &str) -> (Option<String>, Option<String>) {
    let mut id = None;
    let mut version = None;

    for line in contents.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(unquote(value).to_string());
        } else if let Some(value) = line.strip_prefix("VERSION_ID=") {
            version = Some(unquote(value).to_string());
        }
    }

    (id.filter(|s| !s.is_empty()), version.filter(|s| !s.is_empty()))
}

/// Strips one pair of surrounding double quotes, if present.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
