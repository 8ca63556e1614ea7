//! Platform-to-artifact resolution.
//!
//! Pure mapping from a [`PlatformTuple`] to the single prebuilt SDK artifact
//! that platform should link against. The old nested-conditional selection
//! is expressed here as an ordered cascade — most specific rule first, first
//! match wins — so every reachable tuple resolves to exactly one descriptor
//! and new platform branches slot in without touching provisioning or build
//! logic. No I/O, no side effects.

use std::path::PathBuf;

use crate::platform::{OsFamily, PlatformTuple};

/// Base URL of the artifact server publishing the prebuilt SDK archives.
const BASE_URL: &str = "https://onewayautomation.com/opcua-binaries/sdk";

/// Local name the downloaded archive is saved under before unpacking.
const ARCHIVE_FILE_NAME: &str = "OpcUaSdk.zip";

/// Static-library path for Linux platforms, relative to the source root.
const LINUX_LIB_PATH: &str = "ogamma-sdk/lib/libOpcUaSdk.a";

/// Import-library path for Windows, relative to the source root.
const WINDOWS_LIB_PATH: &str = "ogamma-sdk/lib/OpcUaSdk.lib";

/// Where a platform's prebuilt SDK artifact comes from and where it lives
/// locally once provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// Download URL of the compressed archive.
    pub remote_url: String,
    /// Path of the library file relative to the source root. Its presence is
    /// the provisioning idempotency check; its parent directory is the
    /// archive extraction root.
    pub local_relative_path: PathBuf,
    /// Filename the archive is downloaded as.
    pub archive_file_name: String,
}

fn descriptor(remote_archive: &str, lib_path: &str) -> ArtifactDescriptor {
    ArtifactDescriptor {
        remote_url: format!("{BASE_URL}/{remote_archive}"),
        local_relative_path: PathBuf::from(lib_path),
        archive_file_name: ARCHIVE_FILE_NAME.to_string(),
    }
}

/// Resolves the artifact descriptor for a platform tuple.
///
/// Total over all reachable tuples: every Linux distro resolves (unknown
/// distros fall back to [`generic_linux`]) and every non-Linux family is
/// Windows by construction of [`PlatformTuple`].
pub fn resolve(tuple: &PlatformTuple) -> ArtifactDescriptor {
    match tuple.os_family {
        OsFamily::Windows => descriptor("vs2022-OpcUaSdk-1.2.4-demo.zip", WINDOWS_LIB_PATH),
        OsFamily::Linux => {
            resolve_linux(tuple.distro.as_deref(), tuple.distro_version.as_deref())
        }
    }
}

/// Ordered Linux rule cascade, most specific first.
fn resolve_linux(distro: Option<&str>, version: Option<&str>) -> ArtifactDescriptor {
    match (distro, version) {
        (Some("ubuntu"), Some("18.04")) => {
            descriptor("ubuntu1804-OpcUaSdk-1.1.2-demo.zip", LINUX_LIB_PATH)
        }
        (Some("ubuntu"), _) => modern_ubuntu(),
        (Some("debian"), _) => descriptor("debian1010-OpcUaSdk-1.1.2-demo.zip", LINUX_LIB_PATH),
        (Some("rhel"), _) => descriptor("rhel84-OpcUaSdk-1.1.2-demo.zip", LINUX_LIB_PATH),
        _ => generic_linux(),
    }
}

/// Default artifact for ubuntu releases newer than 18.04.
fn modern_ubuntu() -> ArtifactDescriptor {
    descriptor("ubuntu2004-OpcUaSdk-1.1.2-demo.zip", LINUX_LIB_PATH)
}

/// Documented fallback for Linux distros without a dedicated artifact.
///
/// Unrecognized glibc-based distros get the modern-ubuntu build — the most
/// broadly compatible Linux artifact the server publishes — rather than
/// failing fast before a link attempt can tell us anything.
fn generic_linux() -> ArtifactDescriptor {
    modern_ubuntu()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
