//! Typed failure taxonomy for the provisioning pipeline.
//!
//! Each pipeline stage gets its own error family, and within provisioning
//! the recoverable/fatal split is a type-level decision rather than a
//! caught-and-ignored broad exception: callers ask `is_recoverable()` and
//! the compiler keeps the classification honest when variants change.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The host OS could not be classified as one of the supported families.
///
/// Fatal: nothing downstream can run without knowing the target platform.
#[derive(Debug, Error)]
#[error("cannot classify host platform for target triple '{triple}'")]
pub struct PlatformError {
    /// The compile-time target triple that failed classification.
    pub triple: String,
}

/// Failures while ensuring the prebuilt SDK artifact exists locally.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Download failed: connect error, non-success HTTP status, or a
    /// truncated response body. Recoverable — a previously provisioned
    /// artifact may still satisfy the build.
    #[error("download of '{url}' failed: {reason}")]
    Fetch { url: String, reason: String },

    /// The fetched archive could not be decoded. Recoverable for the same
    /// reason as `Fetch`.
    #[error("archive '{}' could not be unpacked: {reason}", .path.display())]
    Unpack { path: PathBuf, reason: String },

    /// Anything the filesystem throws back: disk full, permission denied,
    /// unwritable extraction target. Fatal — continuing would hide a
    /// genuinely broken workspace behind a "probably cached" assumption.
    #[error("provisioning I/O failure at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProvisionError {
    /// Whether the pipeline may log this failure and continue.
    ///
    /// Only fetch and archive-decode failures qualify: the artifact may have
    /// been placed manually in an offline or firewalled environment, and the
    /// build stage will surface a truly missing library at link time.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Unpack { .. })
    }
}

/// Which of the two toolchain invocations failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainPhase {
    /// Build-file generation (`cmake -S <src> -B <build> -D...`).
    Generate,
    /// Build execution (`cmake --build <build>`).
    Execute,
}

impl fmt::Display for ToolchainPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generate => write!(f, "generate"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// The external build toolchain reported failure. Always fatal.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The toolchain program could not be started at all.
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The toolchain ran but exited unsuccessfully.
    #[error("'{program}' {phase} phase failed: {status}")]
    Phase {
        program: String,
        phase: ToolchainPhase,
        status: std::process::ExitStatus,
    },
}

/// Failures while staging build outputs into the package layout.
///
/// A missing executable means the build did not actually succeed even if the
/// toolchain reported success, so both variants are fatal.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("expected build output missing at '{}'", .path.display())]
    MissingOutput { path: PathBuf },

    #[error("failed to stage '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
