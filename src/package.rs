//! Staging of build outputs into the publishable layout.
//!
//! Pure copy operations: the built executable and the runtime configuration
//! document move from `<build>/bin/` into `<output>/bin/`. A missing
//! executable is fatal — the build did not actually succeed even if the
//! toolchain said so. A missing runtime document only warns; the application
//! needs it at runtime, not to exist as a package.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PackageError;
use crate::output;
use crate::toolchain::AUX_DOCUMENT_NAME;

/// Executable name produced by the build, without the Windows extension.
pub const EXECUTABLE_BASE_NAME: &str = "sampleApp";

/// Copies every build output matching the application name — the executable
/// plus sidecars like debug symbols — and the runtime document into
/// `<output_root>/bin/`. Returns the staged executable path.
pub fn stage(build_root: &Path, output_root: &Path) -> Result<PathBuf, PackageError> {
    let bin_dir = build_root.join("bin");
    let out_bin = output_root.join("bin");

    fs::create_dir_all(&out_bin).map_err(|e| PackageError::Io {
        path: out_bin.clone(),
        source: e,
    })?;

    let outputs = matching_outputs(&bin_dir);
    let exe_name = format!("{EXECUTABLE_BASE_NAME}.exe");
    let executable = outputs
        .iter()
        .find(|(_, name)| name.as_str() == EXECUTABLE_BASE_NAME || name.as_str() == exe_name)
        .map(|(_, name)| name.clone())
        .ok_or_else(|| PackageError::MissingOutput {
            path: bin_dir.join(EXECUTABLE_BASE_NAME),
        })?;

    for (source, file_name) in &outputs {
        let dest = out_bin.join(file_name);
        fs::copy(source, &dest).map_err(|e| PackageError::Io {
            path: source.clone(),
            source: e,
        })?;
        output::success("Package", &format!("staged {}", dest.display()));
    }

    let aux_source = bin_dir.join(AUX_DOCUMENT_NAME);
    match fs::copy(&aux_source, out_bin.join(AUX_DOCUMENT_NAME)) {
        Ok(_) => {}
        Err(e) => output::warn(&format!(
            "runtime document {} not staged: {e}",
            aux_source.display()
        )),
    }

    Ok(out_bin.join(executable))
}

/// Files in the build bin directory matching the packaging pattern: the
/// bare executable name or `sampleApp.<ext>` (the Windows executable and any
/// sidecar outputs such as `.pdb`). Sorted for deterministic staging order.
fn matching_outputs(bin_dir: &Path) -> Vec<(PathBuf, String)> {
    let mut outputs = Vec::new();
    let Ok(entries) = fs::read_dir(bin_dir) else {
        return outputs;
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        let matches = name == EXECUTABLE_BASE_NAME
            || name
                .strip_prefix(EXECUTABLE_BASE_NAME)
                .is_some_and(|rest| rest.starts_with('.'));
        if matches && entry.path().is_file() {
            outputs.push((entry.path(), name));
        }
    }

    outputs.sort_by(|a, b| a.1.cmp(&b.1));
    outputs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
