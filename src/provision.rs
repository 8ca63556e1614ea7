//! Idempotent provisioning of the prebuilt SDK artifact.
//!
//! `ensure()` is the only entry point the pipeline uses: it checks for the
//! library file on disk, and only when absent downloads the archive to a
//! temporary directory and unpacks it under the artifact's expected folder.
//! The filesystem is the persistent state — a repeated run against an
//! already-provisioned source root performs no network I/O at all.
//!
//! Failure policy: fetch and archive-decode failures are *recoverable* (the
//! artifact may have been placed manually in an offline environment, so the
//! pipeline logs a warning and continues); filesystem failures are fatal and
//! propagate. See [`ProvisionError::is_recoverable`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ProvisionError;
use crate::output;
use crate::resolver::ArtifactDescriptor;

/// User-Agent header sent with artifact downloads.
const USER_AGENT: &str = "uabuild";

/// HTTP request timeout for artifact downloads.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Outcome of one provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningResult {
    /// Absolute or root-relative path the build will link against.
    pub artifact_path: PathBuf,
    /// True when this run fetched and unpacked the archive.
    pub was_downloaded: bool,
    /// True when the artifact was already on disk and nothing was fetched.
    pub was_cached: bool,
}

/// Ensures the artifact described by `descriptor` exists under `source_root`.
///
/// Exactly one fetch attempt per run, no retry. A recoverable failure
/// returns `Ok` with both flags false — the build stage will surface a truly
/// missing library at link time with a far better diagnostic than a guess
/// here could give.
pub fn ensure(
    descriptor: &ArtifactDescriptor,
    source_root: &Path,
) -> Result<ProvisioningResult, ProvisionError> {
    let full_path = source_root.join(&descriptor.local_relative_path);

    if full_path.exists() {
        output::detail(&format!(
            "found provisioned artifact at {}",
            full_path.display()
        ));
        return Ok(ProvisioningResult {
            artifact_path: full_path,
            was_downloaded: false,
            was_cached: true,
        });
    }

    match fetch_and_unpack(descriptor, &full_path) {
        Ok(()) => Ok(ProvisioningResult {
            artifact_path: full_path,
            was_downloaded: true,
            was_cached: false,
        }),
        Err(e) if e.is_recoverable() => {
            output::warn(&format!(
                "{e}; continuing — a previously provisioned artifact may satisfy the build"
            ));
            Ok(ProvisioningResult {
                artifact_path: full_path,
                was_downloaded: false,
                was_cached: false,
            })
        }
        Err(e) => Err(e),
    }
}

/// Downloads the archive to a temp dir and unpacks it into the parent
/// directory of `full_path` (the artifact's expected folder).
fn fetch_and_unpack(
    descriptor: &ArtifactDescriptor,
    full_path: &Path,
) -> Result<(), ProvisionError> {
    let tmp_dir = tempfile::tempdir().map_err(|e| ProvisionError::Io {
        path: std::env::temp_dir(),
        source: e,
    })?;

    let archive_path = download_to_file(
        &descriptor.remote_url,
        tmp_dir.path(),
        &descriptor.archive_file_name,
    )?;

    let unpack_root = match full_path.parent() {
        Some(parent) => parent,
        None => Path::new("."),
    };
    fs::create_dir_all(unpack_root).map_err(|e| ProvisionError::Io {
        path: unpack_root.to_path_buf(),
        source: e,
    })?;

    unpack_archive(&archive_path, unpack_root)
}

/// Downloads a URL to a file in the given directory. Returns the file path.
///
/// Network-side failures (connect error, non-success status, truncated
/// body) map to recoverable `Fetch`; writing the archive to disk is a
/// filesystem concern and maps to fatal `Io`.
pub fn download_to_file(
    url: &str,
    dest_dir: &Path,
    filename: &str,
) -> Result<PathBuf, ProvisionError> {
    let fetch_err = |reason: String| ProvisionError::Fetch {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| fetch_err(format!("failed to build HTTP client: {e}")))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| fetch_err(format!("failed to create Tokio runtime: {e}")))?;

    let bytes = runtime.block_on(async {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(format!("connect error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {status}")));
        }

        response
            .bytes()
            .await
            .map_err(|e| fetch_err(format!("failed to read response body: {e}")))
    })?;

    let dest_path = dest_dir.join(filename);
    fs::write(&dest_path, &bytes).map_err(|e| ProvisionError::Io {
        path: dest_path.clone(),
        source: e,
    })?;

    Ok(dest_path)
}

// ---------------------------------------------------------------------------
// Archive extraction
// ---------------------------------------------------------------------------

/// Unpacks an archive into `dest_dir`, dispatching on the file extension.
///
/// Production descriptors are zip; tar.gz covers locally staged artifacts.
pub fn unpack_archive(archive_path: &Path, dest_dir: &Path) -> Result<(), ProvisionError> {
    let name = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.ends_with(".zip") {
        unpack_zip(archive_path, dest_dir)
    } else if name.ends_with(".tar.gz") {
        unpack_tar_gz(archive_path, dest_dir)
    } else {
        Err(ProvisionError::Unpack {
            path: archive_path.to_path_buf(),
            reason: "unsupported archive format (expected .zip or .tar.gz)".to_string(),
        })
    }
}

fn unpack_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), ProvisionError> {
    let file = fs::File::open(archive_path).map_err(|e| io_err(archive_path, e))?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| zip_err(archive_path, e))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| zip_err(archive_path, e))?;

        // enclosed_name() rejects entries that would escape the extraction root.
        let Some(relative) = entry.enclosed_name() else {
            return Err(ProvisionError::Unpack {
                path: archive_path.to_path_buf(),
                reason: format!("entry '{}' escapes the extraction root", entry.name()),
            });
        };
        let dest = dest_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| io_err(&dest, e))?;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let mut out = fs::File::create(&dest).map_err(|e| io_err(&dest, e))?;
        io::copy(&mut entry, &mut out).map_err(|e| stream_err(archive_path, &dest, e))?;
    }

    Ok(())
}

fn unpack_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<(), ProvisionError> {
    let file = fs::File::open(archive_path).map_err(|e| io_err(archive_path, e))?;
    let decoder = flate2::read::GzDecoder::new(file);
    let mut archive = tar::Archive::new(decoder);

    let entries = archive
        .entries()
        .map_err(|e| stream_err(archive_path, dest_dir, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| stream_err(archive_path, dest_dir, e))?;
        entry
            .unpack_in(dest_dir)
            .map_err(|e| stream_err(archive_path, dest_dir, e))?;
    }

    Ok(())
}

fn io_err(path: &Path, source: io::Error) -> ProvisionError {
    ProvisionError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Maps a zip-crate error: embedded I/O errors stay fatal, anything else is
/// a decode problem and therefore recoverable.
fn zip_err(path: &Path, err: zip::result::ZipError) -> ProvisionError {
    match err {
        zip::result::ZipError::Io(source) => io_err(path, source),
        other => ProvisionError::Unpack {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

/// Classifies an I/O error raised while streaming archive contents: corrupt
/// or truncated data is recoverable, filesystem trouble at the destination
/// is fatal.
fn stream_err(archive_path: &Path, dest: &Path, err: io::Error) -> ProvisionError {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => ProvisionError::Unpack {
            path: archive_path.to_path_buf(),
            reason: err.to_string(),
        },
        _ => io_err(dest, err),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
