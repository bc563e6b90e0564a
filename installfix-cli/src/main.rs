mod config;

use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::ConfigMerger;
use installfix_core::adapters::{FsTreePort, ShellCommandRunner};
use installfix_core::pipeline::{
    ToolError, run_clean, run_fix_ffi, run_patch_header, run_preinstall,
};
use installfix_core::{PatchOutcome, PatchStatus};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "installfix",
    version,
    about = "Install-time hooks for Node projects with native addons."
)]
struct Cli {
    /// Project root containing node_modules (default: current directory).
    #[arg(long, global = true, default_value = ".")]
    project_root: Utf8PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Remove the dependency directory if it exists.
    Clean(CleanArgs),
    /// Patch the generated get-uv-event-loop-napi.h header (fails if it is missing).
    PatchHeader(PatchHeaderArgs),
    /// Patch the header if it is installed, then rebuild the native addon.
    FixFfi(FixFfiArgs),
    /// Verify the pinned Python interpreter and clear the package cache.
    Preinstall(PreinstallArgs),
    /// Print the effective configuration as JSON.
    ShowConfig,
}

#[derive(Debug, Parser)]
struct CleanArgs {
    /// Report what would be removed without deleting anything.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct PatchHeaderArgs {
    /// Print a diff instead of writing the header.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct FixFfiArgs {
    /// Print a diff instead of writing the header; implies no rebuild.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Patch only, do not rebuild the addon.
    #[arg(long, default_value_t = false)]
    skip_rebuild: bool,

    /// Native addon to rebuild (default: ffi-napi).
    #[arg(long)]
    addon: Option<String>,

    /// Package manager executable (default: npm).
    #[arg(long)]
    package_manager: Option<String>,
}

#[derive(Debug, Parser)]
struct PreinstallArgs {
    /// Python interpreter to verify and export as PYTHON.
    #[arg(long, env = "INSTALLFIX_PYTHON")]
    python: Option<String>,

    /// Package manager executable (default: npm).
    #[arg(long)]
    package_manager: Option<String>,

    /// Do not run `<package-manager> cache clean --force`.
    #[arg(long, default_value_t = false)]
    skip_cache_clean: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{:?}", e);
        let code = e
            .downcast_ref::<ToolError>()
            .map(ToolError::exit_code)
            .unwrap_or(1);
        return ExitCode::from(code);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file_config =
        config::load_or_default(&cli.project_root).context("load installfix.toml config")?;
    let merger = ConfigMerger::new(file_config, cli.project_root);

    match cli.cmd {
        Command::Clean(args) => cmd_clean(&merger, args),
        Command::PatchHeader(args) => cmd_patch_header(&merger, args),
        Command::FixFfi(args) => cmd_fix_ffi(&merger, args),
        Command::Preinstall(args) => cmd_preinstall(&merger, args),
        Command::ShowConfig => cmd_show_config(&merger),
    }
}

fn cmd_clean(merger: &ConfigMerger, args: CleanArgs) -> anyhow::Result<()> {
    let settings = merger.merge_clean_args(args.dry_run);
    debug!("clean settings: {:?}", settings);

    let outcome = run_clean(&settings, &FsTreePort).context("clean failed")?;

    let name = outcome.dir.file_name().unwrap_or(outcome.dir.as_str());
    if outcome.removed {
        println!("Cleaned {}", name);
    } else if outcome.existed {
        println!("Would remove {}", outcome.dir);
    }
    Ok(())
}

fn cmd_patch_header(merger: &ConfigMerger, args: PatchHeaderArgs) -> anyhow::Result<()> {
    let settings = merger.merge_patch_header_args(args.dry_run);
    debug!("patch settings: {:?}", settings);

    let outcome = run_patch_header(&settings).context("patch-header failed")?;

    match args.format {
        OutputFormat::Text => print_patch_outcome(&outcome),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }
    Ok(())
}

fn cmd_fix_ffi(merger: &ConfigMerger, args: FixFfiArgs) -> anyhow::Result<()> {
    let settings = merger.merge_fix_ffi_args(
        args.dry_run,
        args.skip_rebuild,
        args.addon.as_deref(),
        args.package_manager.as_deref(),
    );
    debug!("fix-ffi settings: {:?}", settings);

    let outcome = run_fix_ffi(&settings, &ShellCommandRunner).context("postinstall failed")?;

    print_patch_outcome(&outcome.patch);
    if let (true, Some(rebuild)) = (outcome.rebuilt, &settings.rebuild) {
        println!("Rebuilt {}", rebuild.addon);
    }
    Ok(())
}

fn cmd_preinstall(merger: &ConfigMerger, args: PreinstallArgs) -> anyhow::Result<()> {
    let settings = merger.merge_preinstall_args(
        args.python.as_deref(),
        args.package_manager.as_deref(),
        args.skip_cache_clean,
    );
    debug!("preinstall settings: {:?}", settings);

    let outcome = run_preinstall(&settings, &ShellCommandRunner).context("preinstall failed")?;

    println!("Using Python interpreter {}", outcome.python);
    if outcome.cache_cleaned {
        println!("Cleaned package cache");
    }
    Ok(())
}

fn cmd_show_config(merger: &ConfigMerger) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(merger.config())?);
    Ok(())
}

fn print_patch_outcome(outcome: &PatchOutcome) {
    let name = outcome.path.file_name().unwrap_or(outcome.path.as_str());

    if let Some(diff) = &outcome.diff {
        if diff.is_empty() {
            println!("No changes for {}", name);
        } else {
            print!("{}", diff);
        }
        return;
    }

    match outcome.status {
        PatchStatus::Patched => println!("Successfully patched {}", name),
        PatchStatus::Unchanged => println!("Successfully patched {} (already up to date)", name),
        PatchStatus::SkippedMissing => println!("Skipped {}: not installed", name),
    }
}
