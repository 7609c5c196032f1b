//! # Editor Subprocess
//!
//! Launches an external editor on a file with the terminal's stdio inherited,
//! and waits for it. The caller hands the terminal over first (see
//! `Engine::edit`), the editor never runs while the UI owns the screen.

use std::path::Path;
use std::process::{Command, ExitStatus};

use log::{info, warn};
use thiserror::Error;

use crate::tui::EngineError;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no editor configured")]
    NotConfigured,

    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Program plus extra arguments, e.g. `vim` with `-c 'set spell'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    pub command: String,
    pub args: Vec<String>,
}

impl EditorCommand {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }

    /// Build from a program name and a shell-quoted argument string.
    ///
    /// Unbalanced quotes fall back to splitting on whitespace.
    pub fn parse(command: &str, args: &str) -> Self {
        let args = shlex::split(args).unwrap_or_else(|| {
            warn!("Could not parse editor args {:?}, splitting on whitespace", args);
            args.split_whitespace().map(str::to_string).collect()
        });
        Self::new(command.trim(), args)
    }

    /// Run the editor on `path` and block until it exits.
    pub fn open(&self, path: &Path) -> Result<(), EditorError> {
        if self.command.is_empty() {
            return Err(EditorError::NotConfigured);
        }
        info!("Launching {} {:?} {}", self.command, self.args, path.display());
        let status = Command::new(&self.command)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|source| EditorError::Launch {
                program: self.command.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(EditorError::Failed {
                program: self.command.clone(),
                status,
            })
        }
    }
}

impl Default for EditorCommand {
    fn default() -> Self {
        Self::new("vi", Vec::new())
    }
}
