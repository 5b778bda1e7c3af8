use std::{io::ErrorKind, process::Command};

use crate::{EncoderCommand, Result, ToolkitError};

/// Exit code reported when the process was terminated by a signal.
pub const SIGNALLED_EXIT_CODE: i32 = -1;

/// Executes an [`EncoderCommand`] and reports its exit code.
pub trait CommandRunner {
    fn run(&self, command: &EncoderCommand) -> Result<i32>;
}

/// Runs commands as child processes with inherited stdio, blocking until
/// they exit. Non-zero exits are returned, not raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &EncoderCommand) -> Result<i32> {
        tracing::debug!(program = %command.program, args = command.args.len(), "spawning process");

        let status = Command::new(&command.program)
            .args(&command.args)
            .status()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => ToolkitError::ExecutableNotFound {
                    program: command.program.clone(),
                },
                _ => ToolkitError::Io(err),
            })?;

        let code = status.code().unwrap_or(SIGNALLED_EXIT_CODE);
        tracing::debug!(program = %command.program, code, "process exited");
        Ok(code)
    }
}
