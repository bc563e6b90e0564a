//! Error types for installfix-edit.
//!
//! Every variant is a hard failure for the invoking hook; callers map all of
//! them to exit code 1.

use camino::Utf8PathBuf;
use thiserror::Error;

/// The error type for header patch operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// The target file does not exist and the missing-file policy is `Fail`.
    #[error("file not found: {path}")]
    NotFound { path: Utf8PathBuf },

    /// The target file exists but could not be read as UTF-8 text.
    #[error("read {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the patched content back failed (permissions, disk).
    #[error("write {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The patch itself is unusable (e.g. an empty find literal).
    #[error("invalid patch: {reason}")]
    InvalidPatch { reason: String },
}

impl EditError {
    /// Returns true when the failure was caused by a missing target file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EditError::NotFound { .. })
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// Result type alias using EditError.
pub type EditResult<T> = Result<T, EditError>;
