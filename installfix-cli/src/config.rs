//! Configuration file loading for installfix.
//!
//! Discovers and loads `installfix.toml` from the project root.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use installfix_core::settings::{
    CleanSettings, DEFAULT_ADDON, DEFAULT_DEPS_DIR, DEFAULT_PACKAGE_MANAGER, FixFfiSettings,
    PatchSettings, PreinstallSettings, RebuildSettings, default_python,
};
use installfix_core::{MissingFile, TextPatch};
use installfix_edit::{DEFAULT_HEADER_PATH, UV_LOOP_FIND, UV_LOOP_REPLACE};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "installfix.toml";

/// Top-level configuration from installfix.toml.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InstallfixConfig {
    /// Which header to patch and how.
    pub header: HeaderConfig,

    /// Native addon rebuild after patching.
    pub rebuild: RebuildConfig,

    /// Dependency directory removal.
    pub clean: CleanConfig,

    /// Interpreter pin and cache clearing.
    pub preinstall: PreinstallConfig,
}

/// Header section of the config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Header path, relative to the project root unless absolute.
    pub path: Utf8PathBuf,

    /// Exact literal to find.
    pub find: String,

    /// Literal that replaces the first occurrence of `find`.
    pub replace: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            path: Utf8PathBuf::from(DEFAULT_HEADER_PATH),
            find: UV_LOOP_FIND.to_string(),
            replace: UV_LOOP_REPLACE.to_string(),
        }
    }
}

/// Rebuild section of the config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RebuildConfig {
    pub package_manager: String,
    pub addon: String,
    pub update_binary: bool,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            package_manager: DEFAULT_PACKAGE_MANAGER.to_string(),
            addon: DEFAULT_ADDON.to_string(),
            update_binary: true,
        }
    }
}

/// Clean section of the config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CleanConfig {
    pub dir: Utf8PathBuf,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            dir: Utf8PathBuf::from(DEFAULT_DEPS_DIR),
        }
    }
}

/// Preinstall section of the config.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PreinstallConfig {
    /// Interpreter to verify and export as `PYTHON`.
    /// Falls back to `$PYTHON`, then `python3` (`python` on Windows).
    pub python: Option<String>,

    /// Run `<package_manager> cache clean --force`.
    pub clean_cache: bool,
}

impl Default for PreinstallConfig {
    fn default() -> Self {
        Self {
            python: None,
            clean_cache: true,
        }
    }
}

/// Discover the installfix.toml config file.
///
/// Returns `None` if no config file is found in the project root.
pub fn discover_config(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = project_root.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse an installfix.toml config file.
pub fn load_config(path: &Utf8Path) -> anyhow::Result<InstallfixConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config file {}", path))?;
    parse_config(&contents).with_context(|| format!("parse config file {}", path))
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> anyhow::Result<InstallfixConfig> {
    let config: InstallfixConfig = toml::from_str(contents).context("invalid TOML")?;
    Ok(config)
}

/// Load config from the project root, or return default if not found.
pub fn load_or_default(project_root: &Utf8Path) -> anyhow::Result<InstallfixConfig> {
    match discover_config(project_root) {
        Some(path) => load_config(&path),
        None => Ok(InstallfixConfig::default()),
    }
}

/// Builds pipeline settings from the config file and CLI arguments.
///
/// CLI arguments take precedence over config file settings.
pub struct ConfigMerger {
    config: InstallfixConfig,
    project_root: Utf8PathBuf,
}

impl ConfigMerger {
    pub fn new(config: InstallfixConfig, project_root: Utf8PathBuf) -> Self {
        Self {
            config,
            project_root,
        }
    }

    pub fn config(&self) -> &InstallfixConfig {
        &self.config
    }

    /// Settings for `patch-header`: a missing header is an error.
    pub fn merge_patch_header_args(&self, dry_run: bool) -> PatchSettings {
        self.patch_settings(MissingFile::Fail, dry_run)
    }

    /// Settings for `fix-ffi`: a missing header is skipped, then the addon is rebuilt.
    pub fn merge_fix_ffi_args(
        &self,
        dry_run: bool,
        skip_rebuild: bool,
        cli_addon: Option<&str>,
        cli_package_manager: Option<&str>,
    ) -> FixFfiSettings {
        let rebuild = (!skip_rebuild).then(|| RebuildSettings {
            project_root: self.project_root.clone(),
            package_manager: cli_package_manager
                .unwrap_or(&self.config.rebuild.package_manager)
                .to_string(),
            addon: cli_addon.unwrap_or(&self.config.rebuild.addon).to_string(),
            update_binary: self.config.rebuild.update_binary,
        });

        FixFfiSettings {
            patch: self.patch_settings(MissingFile::Skip, dry_run),
            rebuild,
        }
    }

    pub fn merge_clean_args(&self, dry_run: bool) -> CleanSettings {
        CleanSettings {
            project_root: self.project_root.clone(),
            dir: self.config.clean.dir.clone(),
            dry_run,
        }
    }

    /// Settings for `preinstall`.
    ///
    /// Interpreter precedence: CLI/env flag, config file, `$PYTHON`, platform default.
    pub fn merge_preinstall_args(
        &self,
        cli_python: Option<&str>,
        cli_package_manager: Option<&str>,
        skip_cache_clean: bool,
    ) -> PreinstallSettings {
        let python = cli_python
            .filter(|p| !p.trim().is_empty())
            .map(str::to_string)
            .or_else(|| {
                self.config
                    .preinstall
                    .python
                    .clone()
                    .filter(|p| !p.trim().is_empty())
            })
            .unwrap_or_else(default_python);

        PreinstallSettings {
            project_root: self.project_root.clone(),
            python,
            package_manager: cli_package_manager
                .unwrap_or(&self.config.rebuild.package_manager)
                .to_string(),
            clean_cache: self.config.preinstall.clean_cache && !skip_cache_clean,
        }
    }

    fn patch_settings(&self, missing: MissingFile, dry_run: bool) -> PatchSettings {
        PatchSettings {
            project_root: self.project_root.clone(),
            header_path: self.config.header.path.clone(),
            patch: TextPatch::new(
                self.config.header.find.as_str(),
                self.config.header.replace.as_str(),
            ),
            missing,
            dry_run,
        }
    }
}
