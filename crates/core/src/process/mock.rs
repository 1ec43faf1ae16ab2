use super::{CommandOutput, CommandRunner, CommandSpec};
use anyhow::{bail, Result};
use std::sync::RwLock;

enum Scripted {
    Output(CommandOutput),
    SpawnError(String),
}

struct Rule {
    pattern: String,
    response: Scripted,
}

/// Scripted [`CommandRunner`] for tests.
///
/// Responses are matched by substring against the rendered command line;
/// the first matching rule wins. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct MockCommandRunner {
    rules: RwLock<Vec<Rule>>,
    invocations: RwLock<Vec<CommandSpec>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, pattern: &str, output: CommandOutput) -> &Self {
        self.rules.write().unwrap().push(Rule {
            pattern: pattern.to_string(),
            response: Scripted::Output(output),
        });
        self
    }

    pub fn fail_spawn(&self, pattern: &str, message: &str) -> &Self {
        self.rules.write().unwrap().push(Rule {
            pattern: pattern.to_string(),
            response: Scripted::SpawnError(message.to_string()),
        });
        self
    }

    pub fn invocations(&self) -> Vec<CommandSpec> {
        self.invocations.read().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.invocations
            .read()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Index of the first invocation whose command line contains `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.command_lines()
            .iter()
            .position(|line| line.contains(pattern))
    }

    pub fn was_invoked(&self, pattern: &str) -> bool {
        self.position(pattern).is_some()
    }

    fn dispatch(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.invocations.write().unwrap().push(command.clone());

        let line = command.to_string();
        let rules = self.rules.read().unwrap();
        match rules.iter().find(|rule| line.contains(&rule.pattern)) {
            Some(Rule {
                response: Scripted::Output(output),
                ..
            }) => Ok(output.clone()),
            Some(Rule {
                response: Scripted::SpawnError(message),
                ..
            }) => bail!("{}", message),
            None => Ok(CommandOutput::ok("")),
        }
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.dispatch(command)
    }

    fn capture(&self, command: &CommandSpec) -> Result<CommandOutput> {
        self.dispatch(command)
    }
}
