//! Install-hook pipelines, extracted from the CLI.
//!
//! Subprocess and directory side effects go through the port traits; header
//! reads and writes go through `installfix_edit`.

use crate::ports::{CommandRunner, CommandSpec, TreePort};
use crate::settings::{
    CleanSettings, FixFfiSettings, PYTHON_ENV, PatchSettings, PreinstallSettings,
    RebuildSettings,
};
use camino::Utf8PathBuf;
use installfix_edit::{EditError, PatchOptions, PatchOutcome, patch_file};
use tracing::{debug, info};

/// Error type for pipeline results.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("`{command}` exited with {}", display_code(.code))]
    CommandFailed { command: String, code: Option<i32> },

    #[error("failed to spawn `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Edit(e) => e.exit_code(),
            _ => 1,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

/// Patch the header. A missing header is an error unless `settings.missing`
/// says to skip it.
pub fn run_patch_header(settings: &PatchSettings) -> Result<PatchOutcome, ToolError> {
    let path = settings.header_abs();
    debug!(
        path = %path,
        missing = ?settings.missing,
        dry_run = settings.dry_run,
        "patching header"
    );

    let opts = PatchOptions {
        missing: settings.missing,
        dry_run: settings.dry_run,
        diff_root: Some(settings.project_root.clone()),
    };
    let outcome = patch_file(&path, &settings.patch, &opts)?;
    info!(path = %outcome.path, status = ?outcome.status, "header processed");
    Ok(outcome)
}

/// Outcome of `run_fix_ffi`.
#[derive(Debug, Clone)]
pub struct FixFfiOutcome {
    pub patch: PatchOutcome,
    pub rebuilt: bool,
}

/// Patch the header, then rebuild the addon.
///
/// The rebuild runs even when the header was skipped as missing. A dry-run
/// patch never triggers a rebuild.
pub fn run_fix_ffi(
    settings: &FixFfiSettings,
    runner: &dyn CommandRunner,
) -> Result<FixFfiOutcome, ToolError> {
    let patch = run_patch_header(&settings.patch)?;

    let rebuilt = match &settings.rebuild {
        Some(rebuild) if !settings.patch.dry_run => {
            run_rebuild(rebuild, runner)?;
            true
        }
        _ => {
            debug!("rebuild skipped");
            false
        }
    };

    Ok(FixFfiOutcome { patch, rebuilt })
}

/// `<pm> rebuild <addon> [--update-binary]`, run from the project root.
pub fn rebuild_command(settings: &RebuildSettings) -> CommandSpec {
    let mut cmd = CommandSpec::new(program_for(&settings.package_manager))
        .arg("rebuild")
        .arg(settings.addon.as_str())
        .current_dir(&settings.project_root);
    if settings.update_binary {
        cmd = cmd.arg("--update-binary");
    }
    cmd
}

pub fn run_rebuild(
    settings: &RebuildSettings,
    runner: &dyn CommandRunner,
) -> Result<(), ToolError> {
    run_checked(runner, &rebuild_command(settings))
}

/// Outcome of `run_clean`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanOutcome {
    pub dir: Utf8PathBuf,
    pub existed: bool,
    pub removed: bool,
}

/// Remove the dependency directory if it exists.
pub fn run_clean(
    settings: &CleanSettings,
    tree: &dyn TreePort,
) -> Result<CleanOutcome, ToolError> {
    let dir = settings.dir_abs();
    if !tree.exists(&dir) {
        debug!(dir = %dir, "nothing to clean");
        return Ok(CleanOutcome {
            dir,
            existed: false,
            removed: false,
        });
    }

    if settings.dry_run {
        return Ok(CleanOutcome {
            dir,
            existed: true,
            removed: false,
        });
    }

    tree.remove_all(&dir)?;
    info!(dir = %dir, "removed");
    Ok(CleanOutcome {
        dir,
        existed: true,
        removed: true,
    })
}

/// Outcome of `run_preinstall`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreinstallOutcome {
    pub python: String,
    pub cache_cleaned: bool,
}

/// `<python> --version`.
pub fn python_version_command(settings: &PreinstallSettings) -> CommandSpec {
    CommandSpec::new(settings.python.as_str())
        .arg("--version")
        .current_dir(&settings.project_root)
}

/// `<pm> cache clean --force`, with the interpreter exported as `PYTHON`.
pub fn cache_clean_command(settings: &PreinstallSettings) -> CommandSpec {
    CommandSpec::new(program_for(&settings.package_manager))
        .arg("cache")
        .arg("clean")
        .arg("--force")
        .env(PYTHON_ENV, settings.python.as_str())
        .current_dir(&settings.project_root)
}

/// Verify the pinned interpreter runs, then clear the package cache.
pub fn run_preinstall(
    settings: &PreinstallSettings,
    runner: &dyn CommandRunner,
) -> Result<PreinstallOutcome, ToolError> {
    run_checked(runner, &python_version_command(settings))?;

    if settings.clean_cache {
        run_checked(runner, &cache_clean_command(settings))?;
    } else {
        debug!("cache clean disabled");
    }

    Ok(PreinstallOutcome {
        python: settings.python.clone(),
        cache_cleaned: settings.clean_cache,
    })
}

fn run_checked(runner: &dyn CommandRunner, cmd: &CommandSpec) -> Result<(), ToolError> {
    let exit = runner.run(cmd).map_err(|source| ToolError::Spawn {
        command: cmd.to_string(),
        source,
    })?;
    if !exit.success {
        return Err(ToolError::CommandFailed {
            command: cmd.to_string(),
            code: exit.code,
        });
    }
    debug!(command = %cmd, "command succeeded");
    Ok(())
}

/// npm ships as a batch shim on Windows, which `Command` does not resolve
/// from a bare name.
fn program_for(package_manager: &str) -> String {
    if cfg!(windows) && matches!(package_manager, "npm" | "npx" | "pnpm" | "yarn") {
        format!("{}.cmd", package_manager)
    } else {
        package_manager.to_string()
    }
}
