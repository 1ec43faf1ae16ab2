use super::{CommandOutput, CommandRunner, CommandSpec};
use anyhow::{Context, Result};
use std::process::Command;
use tracing::debug;

/// Runs commands with `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }

    fn build(command: &CommandSpec) -> Command {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %command, "Spawning");
        let status = Self::build(command)
            .status()
            .with_context(|| format!("Failed to start '{}'", command.program.display()))?;

        Ok(CommandOutput {
            status: status.code(),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    fn capture(&self, command: &CommandSpec) -> Result<CommandOutput> {
        debug!(command = %command, "Spawning with captured output");
        let output = Self::build(command)
            .output()
            .with_context(|| format!("Failed to start '{}'", command.program.display()))?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
