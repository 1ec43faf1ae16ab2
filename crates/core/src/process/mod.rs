//! Invocation of external collaborators (compiler, test runner, PowerShell, git)

mod mock;
mod system;

pub use mock::MockCommandRunner;
pub use system::SystemCommandRunner;

use anyhow::Result;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path arguments are rendered lossily; collaborators in this repo only take UTF-8 paths.
    pub fn path_arg(self, path: &Path) -> Self {
        let rendered = path.to_string_lossy().into_owned();
        self.arg(rendered)
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program file stem, e.g. `dotnet` for `/usr/share/dotnet/dotnet.exe`.
    pub fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or("command")
            .to_string()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of a command that was started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn exit(code: i32) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// The collaborator's own error text, falling back to the exit status.
    pub fn failure_message(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.status {
            Some(code) => format!("exited with code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands, blocking until they finish.
///
/// `Err` means the command could not be started. A started command that
/// fails is reported through [`CommandOutput::status`].
pub trait CommandRunner: Send + Sync {
    /// Run with inherited stdio so collaborator output reaches the console.
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput>;

    /// Run capturing stdout and stderr.
    fn capture(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_whitespace() {
        let command = CommandSpec::new("pwsh")
            .arg("-Command")
            .arg("Import-Module ./tools/helper.psm1; Start-ResGen");

        assert_eq!(
            command.to_string(),
            "pwsh -Command \"Import-Module ./tools/helper.psm1; Start-ResGen\""
        );
    }

    #[test]
    fn test_tool_name_strips_directory_and_extension() {
        assert_eq!(CommandSpec::new("/usr/share/dotnet/dotnet").tool_name(), "dotnet");
        assert_eq!(CommandSpec::new("C:/tools/git.exe").tool_name(), "git");
    }

    #[test]
    fn test_failure_message_prefers_stderr() {
        let output = CommandOutput {
            status: Some(1),
            stdout: "noise".to_string(),
            stderr: "  error CS0246: type not found \n".to_string(),
        };
        assert_eq!(output.failure_message(), "error CS0246: type not found");
        assert_eq!(CommandOutput::exit(4).failure_message(), "exited with code 4");
        assert_eq!(
            CommandOutput::default().failure_message(),
            "terminated by signal"
        );
    }

    #[test]
    fn test_success() {
        assert!(CommandOutput::ok("").success());
        assert!(!CommandOutput::exit(1).success());
        assert!(!CommandOutput::default().success());
    }
}
