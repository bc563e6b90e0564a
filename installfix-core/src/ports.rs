//! Port traits abstracting process and directory side effects away from the pipeline.

use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// An external command to run to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Extra environment variables layered on top of the inherited environment.
    pub envs: Vec<(String, String)>,
    pub current_dir: Option<Utf8PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: &Utf8Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a finished command exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandExit {
    pub success: bool,
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandExit {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failed(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }
}

/// Blocking command execution with the caller's stdin/stdout/stderr.
pub trait CommandRunner {
    fn run(&self, cmd: &CommandSpec) -> std::io::Result<CommandExit>;
}

/// Directory subtree queries and removal.
pub trait TreePort {
    fn exists(&self, path: &Utf8Path) -> bool;
    /// Remove `path` whether it is a directory tree or a single file.
    fn remove_all(&self, path: &Utf8Path) -> anyhow::Result<()>;
}
