use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;

use uabuild::config::ProjectConfig;
use uabuild::provision::ProvisioningResult;
use uabuild::resolver::ArtifactDescriptor;
use uabuild::{deps, output, package, platform, provision, resolver, toolchain};

/// Build-provisioning tool for the ogamma OPC UA SDK sample application:
/// resolves the platform-specific prebuilt SDK artifact, provisions it
/// idempotently, drives the CMake toolchain, and stages the final package.
#[derive(Parser, Debug)]
#[command(
    name = "uabuild",
    version,
    about,
    after_help = "Examples:\n  uabuild platform\n  uabuild provision --source-root .\n  uabuild run --source-root . --output-root dist"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected platform tuple and the artifact it resolves to.
    Platform,

    /// Ensure the prebuilt SDK artifact is present under the source root.
    Provision {
        /// Root of the application source tree.
        #[arg(long, default_value = ".")]
        source_root: PathBuf,
    },

    /// Run the toolchain generate and execute phases.
    Build {
        /// Root of the application source tree.
        #[arg(long, default_value = ".")]
        source_root: PathBuf,

        /// Build directory; defaults to `<source-root>/build`.
        #[arg(long)]
        build_root: Option<PathBuf>,
    },

    /// Stage built outputs into the publishable bin/ layout.
    Package {
        /// Root of the application source tree.
        #[arg(long, default_value = ".")]
        source_root: PathBuf,

        /// Build directory; defaults to `<source-root>/build`.
        #[arg(long)]
        build_root: Option<PathBuf>,

        /// Package output directory; defaults to `<source-root>/package`.
        #[arg(long)]
        output_root: Option<PathBuf>,
    },

    /// Run the full pipeline: provision, build, package.
    Run {
        /// Root of the application source tree.
        #[arg(long, default_value = ".")]
        source_root: PathBuf,

        /// Build directory; defaults to `<source-root>/build`.
        #[arg(long)]
        build_root: Option<PathBuf>,

        /// Package output directory; defaults to `<source-root>/package`.
        #[arg(long)]
        output_root: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Platform => run_platform(),
        Command::Provision { source_root } => run_provision(&source_root).map(|_| ()),
        Command::Build {
            source_root,
            build_root,
        } => run_build(&source_root, build_root.as_deref()),
        Command::Package {
            source_root,
            build_root,
            output_root,
        } => run_package(&source_root, build_root.as_deref(), output_root.as_deref()),
        Command::Run {
            source_root,
            build_root,
            output_root,
        } => run_pipeline(&source_root, build_root.as_deref(), output_root.as_deref()),
    };

    if let Err(e) = result {
        output::fail("Error", &format!("{e:#}"));
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Subcommand dispatch
// ---------------------------------------------------------------------------

/// Prints the platform tuple, the resolved artifact, and the pinned
/// dependency set the toolchain is expected to provide.
fn run_platform() -> Result<()> {
    let tuple = platform::identify()?;
    let descriptor = resolver::resolve(&tuple);

    println!("platform:  {tuple}");
    println!("artifact:  {}", descriptor.remote_url);
    println!("local lib: {}", descriptor.local_relative_path.display());
    for dep in deps::DEPENDENCIES {
        println!("requires:  {dep}");
    }
    Ok(())
}

/// Identify → resolve → ensure. Shared by the provision and run commands.
fn run_provision(source_root: &Path) -> Result<ProvisioningResult> {
    let tuple = platform::identify()?;
    let config = ProjectConfig::load(source_root)?;
    let descriptor = resolved_descriptor(&tuple, &config);

    output::action("Provision", &descriptor.remote_url);
    let result = provision::ensure(&descriptor, source_root)?;

    if result.was_cached {
        output::success("Provision", "artifact already present");
    } else if result.was_downloaded {
        output::success("Provision", "artifact downloaded and unpacked");
    }
    Ok(result)
}

fn run_build(source_root: &Path, build_root: Option<&Path>) -> Result<()> {
    let tuple = platform::identify()?;
    let config = ProjectConfig::load(source_root)?;
    let build_root = build_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.build_root(source_root));

    let build_config = toolchain::derive_configuration(&tuple, source_root);
    toolchain::build_with_program(
        config.toolchain_program(),
        &build_config,
        source_root,
        &build_root,
    )?;
    output::success("Build", "toolchain finished");
    Ok(())
}

fn run_package(
    source_root: &Path,
    build_root: Option<&Path>,
    output_root: Option<&Path>,
) -> Result<()> {
    let config = ProjectConfig::load(source_root)?;
    let build_root = build_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.build_root(source_root));
    let output_root = output_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_root(source_root));

    package::stage(&build_root, &output_root)?;
    Ok(())
}

/// The whole pipeline, strictly sequential: each stage consumes only the
/// previous stage's output.
fn run_pipeline(
    source_root: &Path,
    build_root: Option<&Path>,
    output_root: Option<&Path>,
) -> Result<()> {
    let tuple = platform::identify()?;
    let config = ProjectConfig::load(source_root)?;
    let build_root = build_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.build_root(source_root));
    let output_root = output_root
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_root(source_root));

    let descriptor = resolved_descriptor(&tuple, &config);
    output::action("Provision", &descriptor.remote_url);
    provision::ensure(&descriptor, source_root)?;

    let build_config = toolchain::derive_configuration(&tuple, source_root);
    toolchain::build_with_program(
        config.toolchain_program(),
        &build_config,
        source_root,
        &build_root,
    )?;

    let staged = package::stage(&build_root, &output_root)?;
    output::success("Done", &format!("package ready at {}", staged.display()));
    Ok(())
}

/// Applies the config's URL override to the resolved descriptor.
fn resolved_descriptor(
    tuple: &platform::PlatformTuple,
    config: &ProjectConfig,
) -> ArtifactDescriptor {
    let mut descriptor = resolver::resolve(tuple);
    if let Some(url) = &config.artifact_url {
        output::detail(&format!("artifact URL overridden by config: {url}"));
        descriptor.remote_url = url.clone();
    }
    descriptor
}
