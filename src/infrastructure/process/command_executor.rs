use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use thiserror::Error;
use tracing::debug;

/// Command executor errors
#[derive(Debug, Error)]
pub enum CommandExecutorError {
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Failed to spawn '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for command execution
#[derive(Debug, Clone, Default)]
pub struct ExecutionConfig {
    /// Working directory for command execution
    pub working_directory: Option<PathBuf>,
}

impl ExecutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.working_directory = Some(dir.as_ref().to_path_buf());
        self
    }
}

/// Result of command execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,

    /// Whether the command exited with status 0
    pub success: bool,
}

/// Runs external programs synchronously.
///
/// Commands are split on whitespace into a program and its arguments; no
/// shell is involved, so quoting and expansions are not interpreted.
#[derive(Debug, Clone, Default)]
pub struct CommandExecutor;

impl CommandExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `command` to completion and collect its output.
    ///
    /// A non-zero exit is not an error here; check [`ExecutionResult::success`].
    pub fn execute(
        &self,
        command: &str,
        config: &ExecutionConfig,
    ) -> Result<ExecutionResult, CommandExecutorError> {
        let start_time = Instant::now();
        let (program, args) = Self::parse_command(command)?;

        let mut cmd = Command::new(&program);
        cmd.args(&args);

        if let Some(working_dir) = &config.working_directory {
            cmd.current_dir(working_dir);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        debug!("Running {} {:?}", program, args);
        let output = cmd
            .output()
            .map_err(|source| CommandExecutorError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        Ok(ExecutionResult {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            execution_time_ms: start_time.elapsed().as_millis() as u64,
            success: output.status.success(),
        })
    }

    /// Split a command line into program and arguments
    fn parse_command(command: &str) -> Result<(String, Vec<String>), CommandExecutorError> {
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| CommandExecutorError::InvalidCommand("Command is empty".to_string()))?;
        Ok((program.to_string(), parts.map(str::to_string).collect()))
    }
}
