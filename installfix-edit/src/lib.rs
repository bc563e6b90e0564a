//! Patch engine for generated native-binding headers.
//!
//! Responsibilities:
//! - Describe an exact-substring patch ([`TextPatch`]) and the well-known
//!   `get-uv-event-loop-napi.h` cast fix.
//! - Apply a patch in memory (first occurrence only).
//! - Apply a patch to a file under a missing-file policy, fingerprinting the
//!   content before and after and optionally rendering a dry-run diff.

pub mod error;

pub use error::{EditError, EditResult};

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use diffy::PatchFormatter;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use tracing::debug;

/// Header location relative to the project root.
pub const DEFAULT_HEADER_PATH: &str =
    "node_modules/get-uv-event-loop-napi-h/include/get-uv-event-loop-napi.h";

/// The assignment that fails to compile: the N-API function pointer does not
/// match the callback type it is assigned to.
pub const UV_LOOP_FIND: &str =
    "get_uv_event_loop_fn get_uv_event_loop = node_api_get_uv_event_loop;";

/// The same assignment with an explicit pointer-type cast.
pub const UV_LOOP_REPLACE: &str = "get_uv_event_loop_fn get_uv_event_loop = reinterpret_cast<get_uv_event_loop_fn>(node_api_get_uv_event_loop);";

/// An exact-substring replacement of one literal with another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPatch {
    pub find: String,
    pub replace: String,
}

impl TextPatch {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// The cast fix for `get-uv-event-loop-napi.h`.
    pub fn uv_event_loop_cast() -> Self {
        Self::new(UV_LOOP_FIND, UV_LOOP_REPLACE)
    }

    pub fn validate(&self) -> EditResult<()> {
        if self.find.is_empty() {
            return Err(EditError::InvalidPatch {
                reason: "find literal is empty".to_string(),
            });
        }
        Ok(())
    }

    /// Replace the first occurrence of `find`. Content without a match is
    /// returned unchanged.
    pub fn apply_to(&self, contents: &str) -> String {
        contents.replacen(&self.find, &self.replace, 1)
    }
}

impl Default for TextPatch {
    fn default() -> Self {
        Self::uv_event_loop_cast()
    }
}

/// What to do when the target file does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFile {
    /// Do nothing and report [`PatchStatus::SkippedMissing`].
    Skip,
    /// Fail with [`EditError::NotFound`].
    #[default]
    Fail,
}

#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    pub missing: MissingFile,
    /// Compute the outcome and a diff without writing.
    pub dry_run: bool,
    /// Diff headers name the file relative to this directory.
    pub diff_root: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchStatus {
    /// The find literal was present and has been replaced.
    Patched,
    /// The find literal was absent (already patched or never present).
    Unchanged,
    /// The file does not exist; nothing was read or written.
    SkippedMissing,
}

/// Result of [`patch_file`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOutcome {
    pub path: Utf8PathBuf,
    pub status: PatchStatus,
    /// Whether the file was written. Unchanged content is still rewritten
    /// outside of dry-run.
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_sha256: Option<String>,
    /// Unified diff, only rendered for dry-run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl PatchOutcome {
    fn skipped(path: &Utf8Path) -> Self {
        Self {
            path: path.to_path_buf(),
            status: PatchStatus::SkippedMissing,
            written: false,
            before_sha256: None,
            after_sha256: None,
            diff: None,
        }
    }
}

/// Read `path`, apply `patch`, and write the result back in one call.
pub fn patch_file(
    path: &Utf8Path,
    patch: &TextPatch,
    opts: &PatchOptions,
) -> EditResult<PatchOutcome> {
    patch.validate()?;

    if opts.missing == MissingFile::Skip && !path.exists() {
        debug!(path = %path, "target missing, skipping");
        return Ok(PatchOutcome::skipped(path));
    }

    let before = read_text(path)?;
    let after = patch.apply_to(&before);
    let status = if before == after {
        PatchStatus::Unchanged
    } else {
        PatchStatus::Patched
    };
    debug!(path = %path, ?status, bytes = before.len(), "patch evaluated");

    let diff = if opts.dry_run {
        let label = diff_label(path, opts.diff_root.as_deref());
        Some(render_diff(&label, &before, &after))
    } else {
        fs::write(path, &after).map_err(|source| EditError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        None
    };

    Ok(PatchOutcome {
        path: path.to_path_buf(),
        status,
        written: !opts.dry_run,
        before_sha256: Some(sha256_hex(before.as_bytes())),
        after_sha256: Some(sha256_hex(after.as_bytes())),
        diff,
    })
}

fn read_text(path: &Utf8Path) -> EditResult<String> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            EditError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            EditError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Slash-separated name for diff headers: `path` relative to `root` when it
/// lies under it, without root, prefix or `.` components.
pub fn diff_label(path: &Utf8Path, root: Option<&Utf8Path>) -> String {
    let rel = root
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Utf8Component::Normal(name) => Some(name),
            Utf8Component::ParentDir => Some(".."),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Render a git-style unified diff for a single file. Empty when unchanged.
pub fn render_diff(label: &str, old: &str, new: &str) -> String {
    if old == new {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("diff --git a/{0} b/{0}\n", label));
    out.push_str(&format!("--- a/{0}\n+++ b/{0}\n", label));

    // diffy names its own headers "original"/"modified"; keep only the hunks.
    let patch = diffy::create_patch(old, new);
    let body = PatchFormatter::new().fmt_patch(&patch).to_string();
    out.push_str(body.find("@@").map_or("", |start| &body[start..]));
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
