//! External build toolchain orchestration.
//!
//! Derives an immutable [`BuildConfiguration`] from the platform tuple and
//! drives the toolchain twice — generate, then execute. The configuration is
//! constructed once and passed in explicitly; nothing here memoizes or
//! reaches into ambient process state. After a successful build the runtime
//! configuration document shipped with the SDK is copied next to the build
//! output, best-effort.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::deps;
use crate::error::{ToolchainError, ToolchainPhase};
use crate::output;
use crate::platform::{OsFamily, PlatformTuple};

/// Program invoked for both toolchain phases unless overridden.
pub const DEFAULT_TOOLCHAIN_PROGRAM: &str = "cmake";

/// Minimum-target-OS define the SDK headers require on Windows.
const WINDOWS_MIN_TARGET_DEFINE: &str = "_WIN32_WINNT";
const WINDOWS_MIN_TARGET_VALUE: &str = "0x0601";

/// Cache define carrying the pinned third-party dependency set.
const DEPENDENCY_SET_DEFINE: &str = "UABUILD_DEPENDENCIES";

/// Cache define carrying the search paths beyond the primary source
/// directory, semicolon-separated for the generated build files.
const SOURCE_PATHS_DEFINE: &str = "UABUILD_SOURCE_PATHS";

/// Runtime configuration document shipped inside the SDK.
pub const AUX_DOCUMENT_NAME: &str = "Opc.Ua.xml";

/// SDK directory holding the runtime document, relative to the source root.
const SDK_BIN_DIR: &str = "ogamma-sdk/bin";

/// Declarative configuration consumed by the generate phase.
///
/// Built from the platform tuple, consumed exactly once. Defines are kept in
/// a BTreeMap so the generate command line is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    pub toolchain_defines: BTreeMap<String, String>,
    pub source_search_paths: Vec<PathBuf>,
}

/// Derives the build configuration for a platform.
pub fn derive_configuration(tuple: &PlatformTuple, source_root: &Path) -> BuildConfiguration {
    let mut defines = BTreeMap::new();

    if tuple.os_family == OsFamily::Windows {
        defines.insert(
            WINDOWS_MIN_TARGET_DEFINE.to_string(),
            WINDOWS_MIN_TARGET_VALUE.to_string(),
        );
    }
    defines.insert(
        DEPENDENCY_SET_DEFINE.to_string(),
        deps::cache_define_value(),
    );

    BuildConfiguration {
        toolchain_defines: defines,
        source_search_paths: vec![source_root.to_path_buf(), source_root.join("ogamma-sdk")],
    }
}

/// Outcome of a toolchain run. Present mostly for the pipeline's benefit:
/// reaching it at all means both phases exited successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOutcome {
    pub success: bool,
}

/// Runs generate and execute with the default toolchain program.
pub fn build(
    config: &BuildConfiguration,
    source_root: &Path,
    build_root: &Path,
) -> Result<BuildOutcome, ToolchainError> {
    build_with_program(DEFAULT_TOOLCHAIN_PROGRAM, config, source_root, build_root)
}

/// Injectable-program entry point used by tests and the config override.
pub fn build_with_program(
    program: &str,
    config: &BuildConfiguration,
    source_root: &Path,
    build_root: &Path,
) -> Result<BuildOutcome, ToolchainError> {
    run_generate(program, config, source_root, build_root)?;
    run_execute(program, build_root)?;
    stage_aux_document(source_root, build_root);
    Ok(BuildOutcome { success: true })
}

/// Generate phase: `<program> -S <primary> -B <build> -DKEY=VALUE...`.
///
/// The first configured search path is the primary source directory; the
/// remaining paths ride along as a cache define, the same way the pinned
/// dependency set does.
fn run_generate(
    program: &str,
    config: &BuildConfiguration,
    source_root: &Path,
    build_root: &Path,
) -> Result<(), ToolchainError> {
    let primary = config
        .source_search_paths
        .first()
        .map(PathBuf::as_path)
        .unwrap_or(source_root);

    let mut cmd = Command::new(program);
    cmd.arg("-S").arg(primary).arg("-B").arg(build_root);

    if config.source_search_paths.len() > 1 {
        let extra = config.source_search_paths[1..]
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(";");
        cmd.arg(format!("-D{SOURCE_PATHS_DEFINE}={extra}"));
    }
    for (key, value) in &config.toolchain_defines {
        cmd.arg(format!("-D{key}={value}"));
    }
    run_phase(cmd, program, ToolchainPhase::Generate)
}

/// Execute phase: `<program> --build <build>`.
fn run_execute(program: &str, build_root: &Path) -> Result<(), ToolchainError> {
    let mut cmd = Command::new(program);
    cmd.arg("--build").arg(build_root);
    run_phase(cmd, program, ToolchainPhase::Execute)
}

fn run_phase(
    mut cmd: Command,
    program: &str,
    phase: ToolchainPhase,
) -> Result<(), ToolchainError> {
    output::action("Toolchain", &format!("{program} {phase}"));

    let status = cmd.status().map_err(|e| ToolchainError::Launch {
        program: program.to_string(),
        source: e,
    })?;

    if !status.success() {
        return Err(ToolchainError::Phase {
            program: program.to_string(),
            phase,
            status,
        });
    }
    Ok(())
}

/// Best-effort copy of the SDK's runtime document into the build output
/// directory, skipped when already present.
///
/// The document is only needed when the built application runs, never at
/// link time, so every failure here is a warning and the pipeline continues.
pub fn stage_aux_document(source_root: &Path, build_root: &Path) {
    let src = source_root.join(SDK_BIN_DIR).join(AUX_DOCUMENT_NAME);
    let dst = build_root.join("bin").join(AUX_DOCUMENT_NAME);

    if dst.exists() {
        return;
    }

    let copy = || -> std::io::Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&src, &dst)?;
        Ok(())
    };

    match copy() {
        Ok(()) => output::detail(&format!("copied {AUX_DOCUMENT_NAME} to {}", dst.display())),
        Err(e) => output::warn(&format!(
            "failed to copy runtime document {}: {e}",
            src.display()
        )),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
