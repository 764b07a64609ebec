//! External command description and execution.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// An external command to run.
///
/// Empty arguments are dropped, so optional flags can be passed as `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    capture: bool,
}

impl Cmd {
    /// Create a command for the given program.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["cargo", "run", "--release"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        Self::new(program).args(iter)
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set the working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Capture stdout/stderr instead of inheriting the terminal.
    pub fn capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    /// Program name as given.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments, in order.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Working directory, if set.
    pub fn working_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Whether output is captured.
    pub fn is_captured(&self) -> bool {
        self.capture
    }
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// What an external command left behind once it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,

    /// Captured stdout (empty unless the command was captured)
    pub stdout: String,

    /// Captured stderr (empty unless the command was captured)
    pub stderr: String,
}

impl Outcome {
    /// An outcome with the given exit code and no output.
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Default::default()
        }
    }

    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Errors that can occur when executing a command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Command has no program")]
    EmptyProgram,

    #[error("Failed to execute `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Executes commands and answers whether a program is installed.
pub trait Runner: Send + Sync {
    /// Run the command to completion.
    ///
    /// A non-zero exit is reported through [`Outcome`], not as an error.
    fn run(&self, cmd: &Cmd) -> Result<Outcome, ExecError>;

    /// Whether `program` can be found on `PATH`.
    fn is_available(&self, program: &str) -> bool;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, cmd: &Cmd) -> Result<Outcome, ExecError> {
        if cmd.program.is_empty() {
            return Err(ExecError::EmptyProgram);
        }

        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        if let Some(dir) = &cmd.cwd {
            command.current_dir(dir);
        }

        tracing::debug!("Running `{}`", cmd);

        let spawn_error = |source| ExecError::Spawn {
            program: cmd.program.to_string_lossy().to_string(),
            source,
        };

        if cmd.capture {
            let output = command
                .stdin(Stdio::null())
                .output()
                .map_err(spawn_error)?;

            Ok(Outcome {
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        } else {
            let status = command.status().map_err(spawn_error)?;
            Ok(Outcome {
                code: status.code(),
                ..Default::default()
            })
        }
    }

    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
