//! Default process- and filesystem-backed port implementations.

use crate::ports::{CommandExit, CommandRunner, CommandSpec, TreePort};
use anyhow::Context;
use camino::Utf8Path;
use fs_err as fs;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{Command, Stdio};
use tracing::debug;

/// Runs commands as child processes with inherited standard streams.
#[derive(Debug, Clone, Default)]
pub struct ShellCommandRunner;

impl CommandRunner for ShellCommandRunner {
    fn run(&self, cmd: &CommandSpec) -> std::io::Result<CommandExit> {
        debug!(command = %cmd, cwd = ?cmd.current_dir, "spawning");

        let mut process = Command::new(&cmd.program);
        process
            .args(&cmd.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        for (key, value) in &cmd.envs {
            process.env(key, value);
        }
        if let Some(dir) = &cmd.current_dir {
            process.current_dir(dir);
        }

        let status = process.status()?;
        Ok(CommandExit {
            success: status.success(),
            code: status.code(),
        })
    }
}

/// In-memory command runner for embedding and testing.
///
/// Records every command it is asked to run and answers with scripted exits
/// in order; once the script is exhausted every command succeeds.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<CommandSpec>>,
    script: RefCell<VecDeque<std::io::Result<CommandExit>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result for the next unanswered command.
    pub fn then(self, result: std::io::Result<CommandExit>) -> Self {
        self.script.borrow_mut().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &CommandSpec) -> std::io::Result<CommandExit> {
        self.calls.borrow_mut().push(cmd.clone());
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(CommandExit::ok()))
    }
}

/// Filesystem directory operations.
#[derive(Debug, Clone, Default)]
pub struct FsTreePort;

impl TreePort for FsTreePort {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.exists()
    }

    fn remove_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
        let meta = fs::symlink_metadata(path).with_context(|| format!("stat {}", path))?;
        if meta.is_dir() {
            fs::remove_dir_all(path).with_context(|| format!("remove_dir_all {}", path))
        } else {
            fs::remove_file(path).with_context(|| format!("remove_file {}", path))
        }
    }
}
