//! Invocation of the external site generator.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::exec::{Cmd, ExecError, Runner};

/// Errors that can occur while running the site generator.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("No site generator command configured")]
    EmptyCommand,

    #[error("Site generator `{command}` exited with code {code}")]
    Exited { command: String, code: i32 },

    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl GeneratorError {
    /// Exit code the caller should propagate.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exited { code, .. } => *code,
            _ => 1,
        }
    }
}

/// Result of a generator run.
#[derive(Debug)]
pub struct GenerateResult {
    /// Wall time of the generator process in milliseconds
    pub duration_ms: u64,

    /// Directory the generator was expected to write
    pub output_dir: PathBuf,
}

/// Runs the configured site generator command.
pub struct Generator<'a> {
    runner: &'a dyn Runner,
    command: Vec<String>,
    output_dir: PathBuf,
    cwd: Option<PathBuf>,
}

impl<'a> Generator<'a> {
    /// Create a generator invocation.
    pub fn new(runner: &'a dyn Runner, command: Vec<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            command,
            output_dir: output_dir.into(),
            cwd: None,
        }
    }

    /// Run the generator from `dir` instead of the current directory.
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Run the generator to completion, inheriting the terminal.
    pub fn run(&self) -> Result<GenerateResult, GeneratorError> {
        if self.command.first().map_or(true, |program| program.is_empty()) {
            return Err(GeneratorError::EmptyCommand);
        }

        let mut cmd = Cmd::from_slice(&self.command);
        if let Some(dir) = &self.cwd {
            cmd = cmd.cwd(dir);
        }

        tracing::info!("Running site generator: {}", cmd);
        let start = Instant::now();

        let outcome = self.runner.run(&cmd)?;
        if !outcome.success() {
            return Err(GeneratorError::Exited {
                command: cmd.to_string(),
                // Killed by a signal
                code: outcome.code.unwrap_or(1),
            });
        }

        let output_dir = match &self.cwd {
            Some(dir) => dir.join(&self.output_dir),
            None => self.output_dir.clone(),
        };
        if !output_dir.is_dir() {
            tracing::warn!(
                "Site generator succeeded but {} does not exist",
                output_dir.display()
            );
        }

        Ok(GenerateResult {
            duration_ms: start.elapsed().as_millis() as u64,
            output_dir,
        })
    }
}
