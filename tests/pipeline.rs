//! Integration tests for toolchain orchestration, packaging, and the full
//! provision → build → stage pipeline.
//!
//! The external toolchain is replaced by small shell stubs so the tests
//! observe exactly what the orchestrator invokes without needing CMake.

#![cfg(unix)]

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::thread;

use uabuild::error::{ToolchainError, ToolchainPhase};
use uabuild::package;
use uabuild::platform::PlatformTuple;
use uabuild::provision::ensure;
use uabuild::toolchain::{self, AUX_DOCUMENT_NAME};

/// Writes an executable shell stub that appends its argv to `log` and exits 0.
fn write_arg_logging_stub(dir: &Path, log: &Path) -> PathBuf {
    let path = dir.join("toolchain-stub.sh");
    let script = format!("#!/bin/sh\necho \"$@\" >> \"{}\"\nexit 0\n", log.display());
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Writes an executable shell stub that fabricates a built executable under
/// `<build>/bin/` the way a real toolchain run would.
fn write_building_stub(dir: &Path, build_root: &Path) -> PathBuf {
    let path = dir.join("toolchain-build-stub.sh");
    let bin = build_root.join("bin");
    let script = format!(
        "#!/bin/sh\nmkdir -p \"{bin}\"\nprintf 'ELF' > \"{exe}\"\nexit 0\n",
        bin = bin.display(),
        exe = bin.join(package::EXECUTABLE_BASE_NAME).display(),
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn linux_tuple() -> PlatformTuple {
    PlatformTuple::linux("x86_64", Some("ubuntu"), Some("20.04"))
}

// ---------------------------------------------------------------------------
// Toolchain invocation
// ---------------------------------------------------------------------------

#[test]
fn orchestrator_runs_generate_then_execute() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("invocations.log");
    let stub = write_arg_logging_stub(dir.path(), &log);

    let source_root = dir.path().join("src");
    let build_root = dir.path().join("build");
    fs::create_dir_all(&source_root).unwrap();

    let config = toolchain::derive_configuration(&linux_tuple(), &source_root);
    let outcome = toolchain::build_with_program(
        stub.to_str().unwrap(),
        &config,
        &source_root,
        &build_root,
    )
    .unwrap();
    assert!(outcome.success);

    let invocations = fs::read_to_string(&log).unwrap();
    let lines: Vec<&str> = invocations.lines().collect();
    assert_eq!(lines.len(), 2, "one generate and one execute invocation");
    assert!(lines[0].contains("-S"), "generate line: {}", lines[0]);
    assert!(lines[0].contains("-B"), "generate line: {}", lines[0]);
    assert!(lines[1].contains("--build"), "execute line: {}", lines[1]);
}

#[test]
fn generate_consumes_configured_search_paths() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("invocations.log");
    let stub = write_arg_logging_stub(dir.path(), &log);

    let source_root = dir.path().join("src");
    fs::create_dir_all(&source_root).unwrap();

    let config = toolchain::derive_configuration(&linux_tuple(), &source_root);
    toolchain::build_with_program(
        stub.to_str().unwrap(),
        &config,
        &source_root,
        &dir.path().join("build"),
    )
    .unwrap();

    let invocations = fs::read_to_string(&log).unwrap();
    let generate_line = invocations.lines().next().unwrap();

    // Primary search path becomes the -S argument; the SDK folder rides
    // along as the search-path cache define.
    assert!(
        generate_line.contains(&format!("-S {}", source_root.display())),
        "generate line: {generate_line}"
    );
    assert!(
        generate_line.contains(&format!(
            "-DUABUILD_SOURCE_PATHS={}",
            source_root.join("ogamma-sdk").display()
        )),
        "generate line: {generate_line}"
    );
}

#[test]
fn generate_carries_dependency_define_but_no_windows_define_on_linux() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("invocations.log");
    let stub = write_arg_logging_stub(dir.path(), &log);

    let source_root = dir.path().join("src");
    fs::create_dir_all(&source_root).unwrap();

    let config = toolchain::derive_configuration(&linux_tuple(), &source_root);
    toolchain::build_with_program(
        stub.to_str().unwrap(),
        &config,
        &source_root,
        &dir.path().join("build"),
    )
    .unwrap();

    let invocations = fs::read_to_string(&log).unwrap();
    assert!(invocations.contains("-DUABUILD_DEPENDENCIES=botan/2.19.2"));
    assert!(!invocations.contains("_WIN32_WINNT"));
}

#[test]
fn generate_injects_min_target_define_on_windows() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("invocations.log");
    let stub = write_arg_logging_stub(dir.path(), &log);

    let source_root = dir.path().join("src");
    fs::create_dir_all(&source_root).unwrap();

    let config = toolchain::derive_configuration(&PlatformTuple::windows("x86_64"), &source_root);
    toolchain::build_with_program(
        stub.to_str().unwrap(),
        &config,
        &source_root,
        &dir.path().join("build"),
    )
    .unwrap();

    let invocations = fs::read_to_string(&log).unwrap();
    assert!(invocations.contains("-D_WIN32_WINNT=0x0601"));
}

#[test]
fn failing_toolchain_is_fatal_at_generate() {
    let dir = tempfile::tempdir().unwrap();
    let config = toolchain::derive_configuration(&linux_tuple(), dir.path());

    let err = toolchain::build_with_program("false", &config, dir.path(), &dir.path().join("b"))
        .unwrap_err();

    match err {
        ToolchainError::Phase { phase, .. } => assert_eq!(phase, ToolchainPhase::Generate),
        other => panic!("expected phase failure, got {other}"),
    }
}

#[test]
fn missing_toolchain_program_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = toolchain::derive_configuration(&linux_tuple(), dir.path());

    let err = toolchain::build_with_program(
        "uabuild-no-such-toolchain",
        &config,
        dir.path(),
        &dir.path().join("b"),
    )
    .unwrap_err();

    assert!(matches!(err, ToolchainError::Launch { .. }));
    assert!(err.to_string().contains("uabuild-no-such-toolchain"));
}

#[test]
fn build_copies_runtime_document_next_to_output() {
    let dir = tempfile::tempdir().unwrap();
    let source_root = dir.path().join("src");
    let build_root = dir.path().join("build");
    let sdk_bin = source_root.join("ogamma-sdk/bin");
    fs::create_dir_all(&sdk_bin).unwrap();
    fs::write(sdk_bin.join(AUX_DOCUMENT_NAME), b"<Opc.Ua/>").unwrap();

    let stub = write_arg_logging_stub(dir.path(), &dir.path().join("invocations.log"));
    let config = toolchain::derive_configuration(&linux_tuple(), &source_root);
    toolchain::build_with_program(stub.to_str().unwrap(), &config, &source_root, &build_root)
        .unwrap();

    assert_eq!(
        fs::read(build_root.join("bin").join(AUX_DOCUMENT_NAME)).unwrap(),
        b"<Opc.Ua/>"
    );
}

#[test]
fn missing_runtime_document_does_not_fail_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let source_root = dir.path().join("src");
    fs::create_dir_all(&source_root).unwrap();

    let stub = write_arg_logging_stub(dir.path(), &dir.path().join("invocations.log"));
    let config = toolchain::derive_configuration(&linux_tuple(), &source_root);

    let outcome = toolchain::build_with_program(
        stub.to_str().unwrap(),
        &config,
        &source_root,
        &dir.path().join("build"),
    )
    .unwrap();
    assert!(outcome.success);
}

// ---------------------------------------------------------------------------
// End to end: provision → build → stage
// ---------------------------------------------------------------------------

/// Serve one zip archive containing the SDK static library.
fn spawn_sdk_server() -> String {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("libOpcUaSdk.a", options).unwrap();
    writer.write_all(b"!<arch>\nsdk").unwrap();
    let body = writer.finish().unwrap().into_inner();

    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let addr = listener.local_addr().unwrap();
    let url = format!("http://{addr}/OpcUaSdk.zip");

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("failed to accept");
        let mut buf = [0u8; 4096];
        let _ = stream.read(&mut buf);
        let header = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let _ = stream.write_all(header.as_bytes());
        let _ = stream.write_all(&body);
        let _ = stream.flush();
    });

    url
}

#[test]
fn full_pipeline_produces_publishable_layout() {
    let dir = tempfile::tempdir().unwrap();
    let source_root = dir.path().join("src");
    let build_root = dir.path().join("build");
    let output_root = dir.path().join("package");
    fs::create_dir_all(&source_root).unwrap();

    // The SDK ships the runtime document alongside its binaries.
    let sdk_bin = source_root.join("ogamma-sdk/bin");
    fs::create_dir_all(&sdk_bin).unwrap();
    fs::write(sdk_bin.join(AUX_DOCUMENT_NAME), b"<Opc.Ua/>").unwrap();

    // Provision: downloads and unpacks the static library.
    let tuple = linux_tuple();
    let mut descriptor = uabuild::resolver::resolve(&tuple);
    assert!(descriptor.remote_url.contains("ubuntu2004"));
    descriptor.remote_url = spawn_sdk_server();
    let result = ensure(&descriptor, &source_root).unwrap();
    assert!(result.was_downloaded);
    assert!(source_root
        .join("ogamma-sdk/lib/libOpcUaSdk.a")
        .is_file());

    // Build: stub toolchain fabricates the executable; orchestrator stages
    // the runtime document next to it.
    let stub = write_building_stub(dir.path(), &build_root);
    let config = toolchain::derive_configuration(&tuple, &source_root);
    assert!(!config.toolchain_defines.contains_key("_WIN32_WINNT"));
    toolchain::build_with_program(stub.to_str().unwrap(), &config, &source_root, &build_root)
        .unwrap();

    // Package: publishable bin/ layout with executable and document.
    let staged = package::stage(&build_root, &output_root).unwrap();
    assert_eq!(
        staged,
        output_root.join("bin").join(package::EXECUTABLE_BASE_NAME)
    );
    assert!(staged.is_file());
    assert_eq!(
        fs::read(output_root.join("bin").join(AUX_DOCUMENT_NAME)).unwrap(),
        b"<Opc.Ua/>"
    );
}
