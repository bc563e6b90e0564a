//! Embeddable core library for installfix.
//!
//! Provides clap-free entry points for the install hooks, suitable for
//! calling from the CLI or from another host process.
//!
//! # Port traits
//!
//! Process and directory side effects are abstracted behind port traits in
//! [`ports`]:
//! - [`CommandRunner`](ports::CommandRunner) — run an external command with inherited stdio
//! - [`TreePort`](ports::TreePort) — probe and remove directory subtrees
//!
//! The [`adapters`] module provides default process- and filesystem-backed
//! implementations.
//!
//! # Entry points
//!
//! - [`run_clean`](pipeline::run_clean) — remove the dependency directory
//! - [`run_patch_header`](pipeline::run_patch_header) — patch the N-API header, failing if absent
//! - [`run_fix_ffi`](pipeline::run_fix_ffi) — patch the header if present, then rebuild the addon
//! - [`run_preinstall`](pipeline::run_preinstall) — verify the interpreter, then clear the package cache

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the patch types so embedders don't need installfix-edit directly.
pub use installfix_edit::{MissingFile, PatchOutcome, PatchStatus, TextPatch};
