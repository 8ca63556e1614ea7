// build.rs — Expose the compile-time target triple as a rustc env var.
//
// Cargo provides the `TARGET` env var to build scripts, which contains the
// canonical target triple (e.g., "x86_64-unknown-linux-gnu", "x86_64-pc-windows-msvc").
// We re-export it as `cargo:rustc-env=TARGET=...` so that runtime code can
// access it via `env!("TARGET")` to classify the host platform when selecting
// the prebuilt SDK artifact.
//
// This is the single source of truth for OS family and architecture in the
// binary; only the Linux distro and version are discovered at runtime.

fn main() {
    // Cargo always sets `TARGET` for build scripts. Read it directly — this is
    // the canonical value the platform identifier keys off.
    let target = std::env::var("TARGET")
        .expect("TARGET env var not set by Cargo. This should never happen in a normal build.");

    println!("cargo:rustc-env=TARGET={target}");
}
