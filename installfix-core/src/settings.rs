//! Clap-free settings for the install-hook pipelines.

use camino::{Utf8Path, Utf8PathBuf};
use installfix_edit::{DEFAULT_HEADER_PATH, MissingFile, TextPatch};

pub const DEFAULT_PACKAGE_MANAGER: &str = "npm";
pub const DEFAULT_ADDON: &str = "ffi-napi";
pub const DEFAULT_DEPS_DIR: &str = "node_modules";

/// Environment variable the interpreter is exported under for child processes.
pub const PYTHON_ENV: &str = "PYTHON";

/// Resolve `rel` against `root` unless it is already absolute.
pub fn resolve(root: &Utf8Path, rel: &Utf8Path) -> Utf8PathBuf {
    if rel.is_absolute() {
        rel.to_path_buf()
    } else {
        root.join(rel)
    }
}

/// Interpreter used when neither the CLI nor the config names one.
pub fn default_python() -> String {
    match std::env::var(PYTHON_ENV) {
        Ok(python) if !python.trim().is_empty() => python,
        _ => fallback_python().to_string(),
    }
}

fn fallback_python() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

/// Settings for patching the header.
#[derive(Debug, Clone)]
pub struct PatchSettings {
    pub project_root: Utf8PathBuf,
    pub header_path: Utf8PathBuf,
    pub patch: TextPatch,
    pub missing: MissingFile,
    pub dry_run: bool,
}

impl PatchSettings {
    pub fn header_abs(&self) -> Utf8PathBuf {
        resolve(&self.project_root, &self.header_path)
    }
}

impl Default for PatchSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            header_path: Utf8PathBuf::from(DEFAULT_HEADER_PATH),
            patch: TextPatch::uv_event_loop_cast(),
            missing: MissingFile::Fail,
            dry_run: false,
        }
    }
}

/// Settings for rebuilding the native addon.
#[derive(Debug, Clone)]
pub struct RebuildSettings {
    pub project_root: Utf8PathBuf,
    pub package_manager: String,
    pub addon: String,
    /// Pass `--update-binary` so prebuilt binaries are refetched.
    pub update_binary: bool,
}

impl Default for RebuildSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            package_manager: DEFAULT_PACKAGE_MANAGER.to_string(),
            addon: DEFAULT_ADDON.to_string(),
            update_binary: true,
        }
    }
}

/// Settings for the patch-then-rebuild hook.
#[derive(Debug, Clone)]
pub struct FixFfiSettings {
    pub patch: PatchSettings,
    /// `None` skips the rebuild.
    pub rebuild: Option<RebuildSettings>,
}

impl Default for FixFfiSettings {
    fn default() -> Self {
        Self {
            patch: PatchSettings {
                missing: MissingFile::Skip,
                ..PatchSettings::default()
            },
            rebuild: Some(RebuildSettings::default()),
        }
    }
}

/// Settings for removing the dependency directory.
#[derive(Debug, Clone)]
pub struct CleanSettings {
    pub project_root: Utf8PathBuf,
    pub dir: Utf8PathBuf,
    pub dry_run: bool,
}

impl CleanSettings {
    pub fn dir_abs(&self) -> Utf8PathBuf {
        resolve(&self.project_root, &self.dir)
    }
}

impl Default for CleanSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            dir: Utf8PathBuf::from(DEFAULT_DEPS_DIR),
            dry_run: false,
        }
    }
}

/// Settings for the preinstall hook.
#[derive(Debug, Clone)]
pub struct PreinstallSettings {
    pub project_root: Utf8PathBuf,
    pub python: String,
    pub package_manager: String,
    pub clean_cache: bool,
}

impl Default for PreinstallSettings {
    fn default() -> Self {
        Self {
            project_root: Utf8PathBuf::from("."),
            python: default_python(),
            package_manager: DEFAULT_PACKAGE_MANAGER.to_string(),
            clean_cache: true,
        }
    }
}
